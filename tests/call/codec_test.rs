use messenger::call::{Call, CallBuilder, CallCodec, CodecError, SignedCall};
use messenger::identity::{AccountId, Keypair};

fn sample() -> SignedCall {
    let alice = Keypair::generate();
    let bob = Keypair::generate();
    CallBuilder::new()
        .caller(&alice)
        .call(Call::Post {
            receiver: AccountId::from_public_key(&bob.public_key()),
            text: "pay attention".into(),
            deposit: 250,
        })
        .nonce(9)
        .build()
        .unwrap()
}

#[test]
fn test_decoded_call_still_authenticates() {
    let signed = sample();

    let bytes = CallCodec::encode(&signed).unwrap();
    let decoded = CallCodec::decode(&bytes).unwrap();

    assert_eq!(decoded, signed);
    assert_eq!(decoded.authenticate().unwrap(), signed.caller());
}

#[test]
fn test_text_encodings() {
    let signed = sample();

    let hex = CallCodec::encode_hex(&signed).unwrap();
    let b64 = CallCodec::encode_base64(&signed).unwrap();

    assert_eq!(CallCodec::decode_hex(&hex).unwrap(), signed);
    assert_eq!(CallCodec::decode_base64(&b64).unwrap(), signed);
    assert!(!b64.contains('='));
}

#[test]
fn test_decode_errors() {
    assert!(matches!(
        CallCodec::decode_hex("zz"),
        Err(CodecError::InvalidHex(_))
    ));
    assert!(matches!(
        CallCodec::decode_base64("***"),
        Err(CodecError::InvalidBase64(_))
    ));
    assert!(matches!(
        CallCodec::decode(&[1, 2, 3]),
        Err(CodecError::DecodeError(_))
    ));
}

#[test]
fn test_tampered_bytes_do_not_authenticate() {
    let signed = sample();
    let mut bytes = CallCodec::encode(&signed).unwrap();

    // The nonce varint sits right after the 32-byte caller key
    bytes[32] ^= 0x01;

    match CallCodec::decode(&bytes) {
        Ok(tampered) => assert!(tampered.authenticate().is_err()),
        Err(_) => {}
    }
}
