#![cfg(feature = "kodo")]

#[path = "../common/mock.rs"]
mod mock;

use kodo_sdk::config::Config;
use kodo_sdk::credentials::StaticCredentialsProvider;
use kodo_sdk::kodo;
use kodo_sdk::kodo::batch::{BatchItemError, Entry, Operation, StorageClass};
use kodo_sdk::region::Region;
use kodo_sdk::transport::{HttpMethod, HttpTransport, Transport, TransportError};
use mock::{MockTransport, form_ops, ok, query_value};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

fn get_client(transport: Arc<dyn Transport>, max_batch_size: usize) -> kodo::Client {
    kodo::Client::builder()
        .transport(transport)
        .endpoint_resolver(Arc::new(Region::Z0))
        .bucket("test-bucket")
        .config(Config {
            max_batch_size,
            ..Default::default()
        })
        .build()
}

/// 每个op都返回成功，data中带上op本身，方便检查顺序
fn echo_batch() -> Arc<MockTransport> {
    MockTransport::new(|_, req| {
        let items: Vec<Value> = form_ops(req)
            .into_iter()
            .map(|op| json!({ "code": 200, "data": { "op": op } }))
            .collect();
        Ok(ok(Value::Array(items)))
    })
}

fn op_of(result: &kodo::batch::BatchResult) -> String {
    result.outcome.as_ref().unwrap()["op"]
        .as_str()
        .unwrap()
        .to_owned()
}

#[tokio::test]
async fn batch_chunks_preserve_order() {
    for n in [0usize, 1, 5, 6, 7, 13] {
        for m in [1usize, 3, 5, 1000] {
            let transport = echo_batch();
            let client = get_client(transport.clone(), m);

            let mut session = client.batch();
            for i in 0..n {
                session.stat(&format!("key-{i}"));
            }
            let expected: Vec<String> = session.operations().iter().map(Operation::command).collect();

            let results = session.execute().await.unwrap();
            assert_eq!(transport.request_count(), n.div_ceil(m), "n={n} m={m}");
            assert_eq!(results.len(), n);
            for (i, r) in results.iter().enumerate() {
                assert_eq!(r.operation_index, i);
                assert_eq!(r.status_code, Some(200));
                assert_eq!(op_of(r), expected[i]);
            }
            assert!(session.is_empty());
        }
    }
}

#[tokio::test]
async fn batch_request_shape() {
    let transport = echo_batch();
    let client = get_client(transport.clone(), 1000);
    client
        .batch()
        .stat("a")
        .delete("b")
        .execute()
        .await
        .unwrap();

    let req = &transport.requests()[0];
    assert_eq!(req.method, HttpMethod::Post);
    assert_eq!(req.base_url, "https://rs-z0.qiniuapi.com");
    assert_eq!(req.path, "/batch");
    assert_eq!(form_ops(req).len(), 2);
}

#[tokio::test]
async fn failed_chunk_does_not_abort_later_chunks() {
    // 7个操作，每片3个 => 3片，第2片（下标1）请求失败
    let transport = MockTransport::new(|i, req| {
        if i == 1 {
            return Err(TransportError::RequestAPIFailed {
                status: "503 Service Unavailable".to_owned(),
                text: "busy".to_owned(),
            });
        }
        let items: Vec<Value> = form_ops(req)
            .into_iter()
            .map(|op| json!({ "code": 200, "data": { "op": op } }))
            .collect();
        Ok(ok(Value::Array(items)))
    });
    let client = get_client(transport.clone(), 3);

    let mut session = client.batch();
    for i in 0..7 {
        session.delete(&format!("k{i}"));
    }
    let results = session.execute().await.unwrap();

    assert_eq!(transport.request_count(), 3);
    assert_eq!(results.len(), 7);
    for r in &results[0..3] {
        assert!(r.is_success());
    }
    for r in &results[3..6] {
        assert!(!r.is_success());
        assert_eq!(r.status_code, None);
        match &r.outcome {
            Err(BatchItemError::Transport(e)) => {
                assert!(matches!(**e, TransportError::RequestAPIFailed { .. }))
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert!(results[6].is_success());
    assert_eq!(results[6].operation_index, 6);
}

#[tokio::test]
async fn partial_server_failure_is_per_item() {
    let transport = MockTransport::with_bodies(vec![json!([
        { "code": 200, "data": { "fsize": 1 } },
        { "code": 612, "data": { "error": "no such file or directory" } },
        { "code": 200 },
    ])]);
    let client = get_client(transport.clone(), 1000);
    let results = client
        .batch()
        .stat("exists")
        .stat("missing")
        .set_storage_class("exists", StorageClass::InfrequentAccess)
        .execute()
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].is_success());
    assert_eq!(results[1].status_code, Some(612));
    match &results[1].outcome {
        Err(BatchItemError::Server { code, message }) => {
            assert_eq!(*code, 612);
            assert_eq!(message, "no such file or directory");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(results[2].outcome.as_ref().unwrap(), &Value::Null);
}

#[tokio::test]
async fn mismatched_response_fails_whole_chunk() {
    let transport = MockTransport::with_bodies(vec![json!([{ "code": 200 }])]);
    let client = get_client(transport.clone(), 1000);
    let results = client
        .batch()
        .stat("a")
        .stat("b")
        .execute()
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| !r.is_success()));
}

#[tokio::test]
async fn invalid_operation_sends_nothing() {
    let transport = echo_batch();
    let client = get_client(transport.clone(), 1000);

    let mut session = client.batch();
    session.stat("ok").add(Operation::Copy {
        src: Entry::new("test-bucket", "a"),
        dest: Entry::new("bad/bucket", "b"),
        force: false,
    });
    let res = session.execute().await;
    assert!(matches!(res, Err(kodo::Error::InvalidInput(_))));
    assert_eq!(transport.request_count(), 0);
    // 参数错误时队列保持不变
    assert_eq!(session.len(), 2);

    let zero = get_client(transport.clone(), 0);
    let res = zero.batch().stat("a").execute().await;
    assert!(matches!(res, Err(kodo::Error::InvalidInput(_))));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn list_objects_pages() {
    let transport = MockTransport::with_bodies(vec![
        json!({ "marker": "m1", "items": [
            { "key": "a", "hash": "h", "fsize": 1, "mimeType": "text/plain", "putTime": 1 },
            { "key": "b", "hash": "h", "fsize": 2, "mimeType": "text/plain", "putTime": 2 },
        ]}),
        json!({ "marker": "m2", "items": [
            { "key": "c", "hash": "h", "fsize": 3, "mimeType": "text/plain", "putTime": 3, "type": 1 },
        ]}),
        json!({ "marker": "", "items": [] }),
    ]);
    let client = get_client(transport.clone(), 1000);

    let items = client
        .list_objects()
        .prefix("")
        .build()
        .lister()
        .collect_all()
        .await
        .unwrap();
    let keys: Vec<_> = items.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, ["a", "b", "c"]);
    assert_eq!(items[2].storage_type, 1);

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].base_url, "https://rsf-z0.qiniuapi.com");
    assert_eq!(requests[0].path, "/list");
    assert_eq!(query_value(&requests[0], "bucket"), Some("test-bucket"));
    assert_eq!(query_value(&requests[0], "prefix"), None);
    assert_eq!(query_value(&requests[2], "marker"), Some("m2"));
}

#[tokio::test]
async fn list_objects_limit() {
    let transport = MockTransport::with_bodies(vec![
        json!({ "marker": "m1", "items": [
            { "key": "a", "hash": "h", "fsize": 1, "mimeType": "text/plain", "putTime": 1 },
            { "key": "b", "hash": "h", "fsize": 2, "mimeType": "text/plain", "putTime": 2 },
        ]}),
    ]);
    let client = get_client(transport.clone(), 1000);

    let mut lister = client.list_objects().limit(2).build().lister();
    assert_eq!(lister.next().await.unwrap().unwrap().key, "a");
    assert_eq!(lister.next().await.unwrap().unwrap().key, "b");
    assert!(lister.next().await.is_none());
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn stat_object_request() {
    let transport = MockTransport::with_bodies(vec![json!({
        "fsize": 10, "hash": "FhH", "mimeType": "image/png", "putTime": 15000000000000000i64
    })]);
    let client = get_client(transport.clone(), 1000);
    let stat = client.stat_object("a.png").await.unwrap();
    assert_eq!(stat.fsize, 10);
    assert_eq!(stat.mime_type, "image/png");

    let req = &transport.requests()[0];
    assert_eq!(req.method, HttpMethod::Get);
    // "test-bucket:a.png"
    assert_eq!(req.path, "/stat/dGVzdC1idWNrZXQ6YS5wbmc=");

    assert!(matches!(
        client.stat_object("").await,
        Err(kodo::Error::InvalidInput(_))
    ));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn transport_error_surfaces_from_single_calls() {
    let transport = MockTransport::new(|_, _| Err(TransportError::Common("timeout".to_owned())));
    let client = get_client(transport, 1000);
    assert!(matches!(
        client.buckets().await,
        Err(kodo::Error::Transport(_))
    ));
}

#[tokio::test]
async fn public_url_follows_config_scheme() {
    let client = kodo::Client::builder()
        .transport(echo_batch())
        .endpoint_resolver(Arc::new(Region::Z1))
        .bucket("b")
        .config(Config {
            use_https: false,
            ..Default::default()
        })
        .build();
    let mut url = client.public_url("d.com", "a b/c");
    assert_eq!(url.render(), "http://d.com/a%20b%2Fc");
    url.set_filename("x.png");
    assert_eq!(url.to_string(), "http://d.com/a%20b%2Fc?attname=x.png");
}

#[derive(Deserialize, Debug)]
pub struct KodoConfig {
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
}

impl KodoConfig {
    pub fn get_conf() -> Self {
        let file_str = std::fs::read_to_string("tests/kodo/config.toml").unwrap();
        toml::from_str(&file_str).unwrap()
    }
}

#[tokio::test]
#[ignore]
async fn live_list_and_stat_test() {
    let conf = KodoConfig::get_conf();
    let creds = Arc::new(StaticCredentialsProvider::new(conf.access_key, conf.secret_key));
    let transport = Arc::new(HttpTransport::builder().credentials_provider(creds).build());
    let client = kodo::Client::builder()
        .transport(transport)
        .endpoint_resolver(Arc::new(Region::Z0))
        .bucket(conf.bucket)
        .build();

    let items = client.list_objects().limit(5).build().lister().collect_all().await;
    match items {
        Ok(items) => {
            println!("items:\n{:#?}", items);
            let mut session = client.batch();
            for item in &items {
                session.stat(&item.key);
            }
            let results = session.execute().await.unwrap();
            println!("results:\n{:#?}", results);
        }
        Err(e) => println!("error: {}", e),
    }
}
