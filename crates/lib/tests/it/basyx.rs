//! Round trips over the framed binary TCP transport.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use vab::{Node, metaprotocol::Envelope, node::NodeMap, wire};

use crate::helpers::{connect, device_model, start_basyx};

#[tokio::test]
async fn test_get_over_socket() {
    let (_server, addr) = start_basyx(device_model()).await;
    let client = connect(&format!("basyx://{addr}"));

    assert_eq!(client.get("propertyA").await.unwrap(), Node::Int(10));
    assert_eq!(
        client.get("submodel/propertyA").await.unwrap(),
        Node::Int(10)
    );
    assert_eq!(client.get("idShort").await.unwrap(), "device0");
}

#[tokio::test]
async fn test_set_round_trip() {
    let (_server, addr) = start_basyx(device_model()).await;
    let client = connect(&format!("basyx://{addr}"));

    client.set("propertyA", Node::Int(42)).await.unwrap();
    assert_eq!(client.get("propertyA").await.unwrap(), Node::Int(42));
}

#[tokio::test]
async fn test_failed_write_leaves_state_untouched() {
    let (_server, addr) = start_basyx(device_model()).await;
    let client = connect(&format!("basyx://{addr}"));

    let err = client.set("no/such/path", Node::Int(1)).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(client.get("propertyA").await.unwrap(), Node::Int(10));
}

#[tokio::test]
async fn test_create_and_delete() {
    let (_server, addr) = start_basyx(device_model()).await;
    let client = connect(&format!("basyx://{addr}"));

    client
        .create("submodel/propertyB", Node::from(3.5f64))
        .await
        .unwrap();
    assert_eq!(
        client.get("submodel/propertyB").await.unwrap(),
        Node::Float(3.5)
    );

    // Delete by key.
    client.delete("submodel/propertyB", None).await.unwrap();
    let err = client.get("submodel/propertyB").await.unwrap_err();
    assert!(err.is_not_found());

    // Create into a list appends; delete by value removes the match.
    client
        .create("submodel/tags", Node::from("extra"))
        .await
        .unwrap();
    assert_eq!(
        client.get("submodel/tags").await.unwrap(),
        Node::List(vec![
            Node::from("sensor"),
            Node::from("demo"),
            Node::from("extra")
        ])
    );
    client
        .delete("submodel/tags", Some(Node::from("demo")))
        .await
        .unwrap();
    assert_eq!(
        client.get("submodel/tags").await.unwrap(),
        Node::List(vec![Node::from("sensor"), Node::from("extra")])
    );
}

#[tokio::test]
async fn test_invoke_operation() {
    let (_server, addr) = start_basyx(device_model()).await;
    let client = connect(&format!("basyx://{addr}"));

    let result = client
        .invoke("sum", vec![Node::Int(1), Node::Int(2), Node::Int(3)])
        .await
        .unwrap();
    assert_eq!(result, Node::Int(6));
}

#[tokio::test]
async fn test_computed_property_is_transparent() {
    let (_server, addr) = start_basyx(device_model()).await;
    let client = connect(&format!("basyx://{addr}"));

    assert_eq!(client.get("temperature").await.unwrap(), Node::Int(21));
    client.set("temperature", Node::Int(25)).await.unwrap();
    assert_eq!(client.get("temperature").await.unwrap(), Node::Int(25));

    // Reading the whole model yields the resolved value, never a stub.
    let root = client.get("").await.unwrap();
    let map: &NodeMap = root.as_map().unwrap();
    assert_eq!(map.get("temperature"), Some(&Node::Int(25)));
}

#[tokio::test]
async fn test_errors_cross_the_wire_typed() {
    let (_server, addr) = start_basyx(device_model()).await;
    let client = connect(&format!("basyx://{addr}"));

    let err = client.get("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_transport());
    assert!(err.to_string().contains("missing"));

    let err = client.invoke("propertyA", vec![]).await.unwrap_err();
    assert!(err.is_malformed_request());
}

#[tokio::test]
async fn test_connection_refused_is_a_transport_error() {
    let (server, addr) = {
        let (mut server, addr) = start_basyx(device_model()).await;
        server.stop().unwrap();
        (server, addr)
    };
    drop(server);

    let client = connect(&format!("basyx://{addr}"));
    let err = client.get("propertyA").await.unwrap_err();
    assert!(err.is_transport());
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_unknown_opcode_answered_with_envelope() {
    let (_server, addr) = start_basyx(device_model()).await;

    let mut stream = tokio::net::TcpStream::connect(&addr).await.unwrap();
    // A frame whose opcode byte is outside the known range.
    let mut frame = wire::encode_request(&wire::RequestFrame {
        opcode: wire::Opcode::Get,
        path: "propertyA".to_string(),
        payload: None,
    });
    frame[4] = 99;
    stream.write_all(&frame).await.unwrap();

    let mut len_bytes = [0u8; 4];
    stream.read_exact(&mut len_bytes).await.unwrap();
    let mut body = vec![0u8; u32::from_be_bytes(len_bytes) as usize];
    stream.read_exact(&mut body).await.unwrap();

    let response = wire::decode_response(&body).unwrap();
    assert_eq!(response.status, wire::STATUS_ERROR);
    let envelope: Envelope = serde_json::from_slice(&response.body).unwrap();
    assert!(!envelope.success);
    assert!(envelope.into_result().unwrap_err().is_malformed_request());
}
