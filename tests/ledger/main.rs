// Ledger integration tests

mod properties_test;
