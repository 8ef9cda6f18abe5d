//! SMTP dialogues against a scripted stream.

#![allow(clippy::unwrap_used)]

use credrenew_smtp::{Address, Client, Envelope, Error, Message};
use tokio_test::io::Builder;

fn envelope() -> Envelope {
    Envelope::new(
        Address::new("renewer@example.com").unwrap(),
        vec![Address::new("ops@example.com").unwrap()],
    )
}

#[tokio::test]
async fn test_authenticated_submission() {
    // "\0bot\0s3cret" in base64
    let stream = Builder::new()
        .read(b"220 mx.example.com ESMTP ready\r\n")
        .write(b"EHLO renewer.local\r\n")
        .read(b"250-mx.example.com\r\n250-SIZE 1000000\r\n250 AUTH PLAIN LOGIN\r\n")
        .write(b"AUTH PLAIN AGJvdABzM2NyZXQ=\r\n")
        .read(b"235 2.7.0 Authentication successful\r\n")
        .write(b"MAIL FROM:<renewer@example.com>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<ops@example.com>\r\n")
        .read(b"250 OK\r\n")
        .write(b"DATA\r\n")
        .read(b"354 End data with <CR><LF>.<CR><LF>\r\n")
        .write(b"Subject: hi\r\n\r\n..dot\r\nbye\r\n.\r\n")
        .read(b"250 Queued\r\n")
        .write(b"QUIT\r\n")
        .read(b"221 Bye\r\n")
        .build();

    let client = Client::from_stream(stream).await.unwrap();
    assert_eq!(client.server_info().hostname, "mx.example.com");

    let client = client.ehlo("renewer.local").await.unwrap();
    assert_eq!(client.server_info().auth_mechanisms(), vec!["PLAIN", "LOGIN"]);
    assert_eq!(client.server_info().max_message_size(), Some(1_000_000));

    let mut client = client.auth_plain("bot", "s3cret").await.unwrap();
    client
        .send(&envelope(), b"Subject: hi\n\n.dot\nbye\n")
        .await
        .unwrap();
    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_unauthenticated_relay_with_rendered_message() {
    let envelope = envelope();
    let message = Message::new(&envelope, "status", "all good");
    let payload = message.to_bytes();
    let mut expected = payload.clone();
    expected.extend_from_slice(b".\r\n");

    let stream = Builder::new()
        .read(b"220 relay ESMTP\r\n")
        .write(b"EHLO renewer.local\r\n")
        .read(b"250 relay\r\n")
        .write(b"MAIL FROM:<renewer@example.com>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<ops@example.com>\r\n")
        .read(b"250 OK\r\n")
        .write(b"DATA\r\n")
        .read(b"354 go\r\n")
        .write(&expected)
        .read(b"250 OK\r\n")
        .build();

    let client = Client::from_stream(stream).await.unwrap();
    let mut client = client.ehlo("renewer.local").await.unwrap().without_auth();
    client.send(&envelope, &payload).await.unwrap();
}

#[tokio::test]
async fn test_rejected_credentials() {
    let stream = Builder::new()
        .read(b"220 mx ESMTP\r\n")
        .write(b"EHLO renewer.local\r\n")
        .read(b"250-mx\r\n250 AUTH PLAIN\r\n")
        .write(b"AUTH PLAIN AGJvdABzM2NyZXQ=\r\n")
        .read(b"535 5.7.8 Authentication credentials invalid\r\n")
        .build();

    let client = Client::from_stream(stream).await.unwrap();
    let client = client.ehlo("renewer.local").await.unwrap();
    let err = client.auth_plain("bot", "s3cret").await.unwrap_err();
    assert!(matches!(err, Error::Smtp { code: 535, .. }));
    assert!(err.is_permanent());
}

#[tokio::test]
async fn test_rejected_recipient() {
    let stream = Builder::new()
        .read(b"220 relay ESMTP\r\n")
        .write(b"EHLO renewer.local\r\n")
        .read(b"250 relay\r\n")
        .write(b"MAIL FROM:<renewer@example.com>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<ops@example.com>\r\n")
        .read(b"550 5.1.1 No such user\r\n")
        .build();

    let client = Client::from_stream(stream).await.unwrap();
    let mut client = client.ehlo("renewer.local").await.unwrap().without_auth();
    let err = client.send(&envelope(), b"body").await.unwrap_err();
    assert!(matches!(err, Error::Smtp { code: 550, ref message } if message.contains("No such user")));
}

#[tokio::test]
async fn test_unavailable_greeting() {
    let stream = Builder::new()
        .read(b"554 No SMTP service here\r\n")
        .build();

    let err = Client::from_stream(stream).await.unwrap_err();
    assert!(matches!(err, Error::Smtp { code: 554, .. }));
}

#[tokio::test]
async fn test_connection_closed_mid_reply() {
    let stream = Builder::new()
        .read(b"220 mx ESMTP\r\n")
        .write(b"EHLO renewer.local\r\n")
        .read(b"250-mx\r\n")
        .build();

    let client = Client::from_stream(stream).await.unwrap();
    let err = client.ehlo("renewer.local").await.unwrap_err();
    assert!(matches!(err, Error::Closed));
}
