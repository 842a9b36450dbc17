//! Round trips over the HTTP verb mapping.

use vab::{Node, metaprotocol::Envelope};

use crate::helpers::{connect, device_model, start_http};

#[tokio::test]
async fn test_all_verbs_over_http() {
    let (_server, addr) = start_http(device_model()).await;
    let client = connect(&format!("http://{addr}"));

    assert_eq!(client.get("propertyA").await.unwrap(), Node::Int(10));

    client.set("propertyA", Node::Int(11)).await.unwrap();
    assert_eq!(client.get("propertyA").await.unwrap(), Node::Int(11));

    client
        .create("submodel/propertyC", Node::from("new"))
        .await
        .unwrap();
    assert_eq!(client.get("submodel/propertyC").await.unwrap(), "new");

    client.delete("submodel/propertyC", None).await.unwrap();
    assert!(
        client
            .get("submodel/propertyC")
            .await
            .unwrap_err()
            .is_not_found()
    );

    let result = client
        .invoke("sum", vec![Node::Int(20), Node::Int(22)])
        .await
        .unwrap();
    assert_eq!(result, Node::Int(42));
}

#[tokio::test]
async fn test_delete_by_value_sends_a_body() {
    let (_server, addr) = start_http(device_model()).await;
    let client = connect(&format!("http://{addr}"));

    client
        .delete("submodel/tags", Some(Node::from("sensor")))
        .await
        .unwrap();
    assert_eq!(
        client.get("submodel/tags").await.unwrap(),
        Node::List(vec![Node::from("demo")])
    );
}

#[tokio::test]
async fn test_errors_cross_http_typed() {
    let (_server, addr) = start_http(device_model()).await;
    let client = connect(&format!("http://{addr}"));

    let err = client.get("missing").await.unwrap_err();
    assert!(err.is_not_found());

    let err = client
        .set("", Node::Int(1))
        .await
        .unwrap_err();
    assert!(err.is_malformed_request());
}

#[tokio::test]
async fn test_failures_answer_http_200() {
    // Success and failure both travel in the envelope; the HTTP status
    // stays 200 either way.
    let (_server, addr) = start_http(device_model()).await;

    let response = reqwest::get(format!("http://{addr}/no/such/path"))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let envelope: Envelope = response.json().await.unwrap();
    assert!(!envelope.success);
    assert!(envelope.into_result().unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_address_path_scopes_the_client() {
    let (_server, addr) = start_http(device_model()).await;
    let client = connect(&format!("http://{addr}/submodel"));

    assert_eq!(client.get("propertyA").await.unwrap(), Node::Int(10));
}
