//! Nested-address forwarding across servers.

use vab::Node;

use crate::helpers::{connect, device_model, start_basyx, start_gateway, start_http};

#[tokio::test]
async fn test_one_hop_forwarding() {
    let (_device, device_addr) = start_basyx(device_model()).await;
    let (_gateway, gateway_addr) = start_gateway().await;

    let client = connect(&format!("basyx://{gateway_addr}"));
    let value = client
        .get(&format!("basyx://{device_addr}/submodel/propertyA"))
        .await
        .unwrap();
    assert_eq!(value, Node::Int(10));
}

#[tokio::test]
async fn test_nested_address_in_connect() {
    // The address's own path carries a nested layer; the client is scoped
    // below the device's submodel without knowing about the hop.
    let (_device, device_addr) = start_basyx(device_model()).await;
    let (_gateway, gateway_addr) = start_gateway().await;

    let client = connect(&format!(
        "basyx://{gateway_addr}//basyx://{device_addr}/submodel"
    ));
    assert_eq!(client.get("propertyA").await.unwrap(), Node::Int(10));
}

#[tokio::test]
async fn test_two_hop_chain() {
    let (_device, device_addr) = start_basyx(device_model()).await;
    let (_inner_gateway, inner_addr) = start_gateway().await;
    let (_outer_gateway, outer_addr) = start_gateway().await;

    let client = connect(&format!("basyx://{outer_addr}"));
    let value = client
        .get(&format!(
            "basyx://{inner_addr}//basyx://{device_addr}/propertyA"
        ))
        .await
        .unwrap();
    assert_eq!(value, Node::Int(10));
}

#[tokio::test]
async fn test_gateway_bridges_transports() {
    // A binary TCP gateway in front of an HTTP device.
    let (_device, device_addr) = start_http(device_model()).await;
    let (_gateway, gateway_addr) = start_gateway().await;

    let client = connect(&format!("basyx://{gateway_addr}"));
    let value = client
        .get(&format!("http://{device_addr}/propertyA"))
        .await
        .unwrap();
    assert_eq!(value, Node::Int(10));
}

#[tokio::test]
async fn test_writes_through_the_chain() {
    let (_device, device_addr) = start_basyx(device_model()).await;
    let (_gateway, gateway_addr) = start_gateway().await;

    let through_gateway = connect(&format!("basyx://{gateway_addr}"));
    through_gateway
        .set(&format!("basyx://{device_addr}/propertyA"), Node::Int(77))
        .await
        .unwrap();

    // Visible when talking to the device directly.
    let direct = connect(&format!("basyx://{device_addr}"));
    assert_eq!(direct.get("propertyA").await.unwrap(), Node::Int(77));

    let result = through_gateway
        .invoke(
            &format!("basyx://{device_addr}/sum"),
            vec![Node::Int(2), Node::Int(3)],
        )
        .await
        .unwrap();
    assert_eq!(result, Node::Int(5));
}

#[tokio::test]
async fn test_typed_errors_survive_the_chain() {
    let (_device, device_addr) = start_basyx(device_model()).await;
    let (_gateway, gateway_addr) = start_gateway().await;

    let client = connect(&format!("basyx://{gateway_addr}"));

    let err = client
        .get(&format!("basyx://{device_addr}/missing"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = client
        .get("opc.tcp://device:4840/sensor")
        .await
        .unwrap_err();
    assert!(err.is_unsupported_scheme());

    let err = client.get("not-an-address").await.unwrap_err();
    assert!(err.is_malformed_request());
}
