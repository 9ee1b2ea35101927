#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use futures_util::future::join_all;
use reqmetrics_core::{Identity, Registry};
use reqmetrics_middleware::obs::RequestMetrics;
use reqmetrics_middleware::rpc::{ClientInterceptor, Code, RpcStatus, ServerCallInfo, ServerInterceptor};

#[derive(Debug, PartialEq)]
struct CallError {
    code: Code,
    message: &'static str,
}

impl RpcStatus for CallError {
    fn code(&self) -> Code {
        self.code
    }
}

fn metrics() -> RequestMetrics {
    RequestMetrics::new(&Registry::new(Identity::new("svc", "h")), "gfast").unwrap()
}

#[tokio::test(start_paused = true)]
async fn client_failure_is_counted_and_returned_unchanged() {
    let m = metrics();
    let client = ClientInterceptor::new(m.clone());

    let res: Result<(), CallError> = client
        .intercept("/Greeter/SayHello", "localhost:50051", async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Err(CallError {
                code: Code::Unavailable,
                message: "connection refused",
            })
        })
        .await;

    assert_eq!(
        res,
        Err(CallError {
            code: Code::Unavailable,
            message: "connection refused",
        })
    );
    let labels = ["/Greeter/SayHello", "grpc", "localhost:50051"];
    assert_eq!(m.client_handle_counter.with_label_values(&labels).get(), 1);

    let snap = m.client_handle_histogram.with_label_values(&labels).snapshot();
    assert_eq!(snap.count, 1);
    assert_eq!(snap.buckets[2], (25.0, 0));
    assert_eq!(snap.buckets[3], (50.0, 1));
}

#[tokio::test]
async fn client_success_passes_value_through() {
    let m = metrics();
    let client = ClientInterceptor::new(m.clone());
    let v: Result<&str, CallError> = client
        .intercept("/Greeter/SayHello", "localhost:50051", async { Ok("hi") })
        .await;
    assert_eq!(v, Ok("hi"));
    assert_eq!(
        m.client_handle_counter
            .with_label_values(&["/Greeter/SayHello", "grpc", "localhost:50051"])
            .get(),
        1
    );
}

#[tokio::test]
async fn server_status_label_is_the_numeric_code() {
    let m = metrics();
    let server = ServerInterceptor::new(m.clone());
    let info = ServerCallInfo::new("/helloworld.Greeter/SayHello").peer("web", "10.0.0.7:4312");

    let ok: Result<u32, CallError> = server.intercept(&info, async { Ok(1) }).await;
    assert_eq!(ok, Ok(1));
    let missing: Result<u32, CallError> = server
        .intercept(&info, async {
            Err(CallError {
                code: Code::NotFound,
                message: "no such user",
            })
        })
        .await;
    assert_eq!(missing.unwrap_err().message, "no such user");

    let hist = |status: &str| {
        m.server_handle_histogram
            .with_label_values(&["/helloworld.Greeter/SayHello", "grpc", status, "web", "10.0.0.7:4312"])
            .snapshot()
            .count
    };
    assert_eq!(hist("0"), 1);
    assert_eq!(hist("5"), 1);
    assert_eq!(
        m.server_handle_counter
            .with_label_values(&["/helloworld.Greeter/SayHello", "grpc", "web", "10.0.0.7:4312"])
            .get(),
        2
    );
}

#[tokio::test]
async fn unknown_peer_uses_empty_labels() {
    let m = metrics();
    let server = ServerInterceptor::new(m.clone());
    let info = ServerCallInfo::new("/svc/Ping");
    let _: Result<(), Code> = server.intercept(&info, async { Err(Code::Internal) }).await;

    assert_eq!(
        m.server_handle_histogram
            .with_label_values(&["/svc/Ping", "grpc", "13", "", ""])
            .snapshot()
            .count,
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_are_all_counted() {
    let m = metrics();
    let client = ClientInterceptor::new(m.clone());

    let calls = (0..64).map(|i| {
        let client = client.clone();
        tokio::spawn(async move {
            let _: Result<(), Code> = client
                .intercept("/svc/Get", "db:5432", async move {
                    if i % 2 == 0 {
                        Ok(())
                    } else {
                        Err(Code::Aborted)
                    }
                })
                .await;
        })
    });
    for r in join_all(calls).await {
        r.unwrap();
    }

    let labels = ["/svc/Get", "grpc", "db:5432"];
    assert_eq!(m.client_handle_counter.with_label_values(&labels).get(), 64);
    assert_eq!(m.client_handle_histogram.with_label_values(&labels).snapshot().count, 64);
}

#[tokio::test]
async fn tonic_status_errors_are_labelled_by_code() {
    let m = metrics();
    let server = ServerInterceptor::new(m.clone());
    let info = ServerCallInfo::new("/helloworld.Greeter/SayHello");

    let denied: Result<tonic::Response<String>, tonic::Status> = server
        .intercept(&info, async { Err(tonic::Status::permission_denied("nope")) })
        .await;
    let st = denied.unwrap_err();
    assert_eq!(st.code(), Code::PermissionDenied);
    assert_eq!(st.message(), "nope");

    let ok: Result<tonic::Response<String>, tonic::Status> = server
        .intercept(&info, async { Ok(tonic::Response::new("hi".to_string())) })
        .await;
    assert_eq!(ok.unwrap().into_inner(), "hi");

    let hist = |status: &str| {
        m.server_handle_histogram
            .with_label_values(&["/helloworld.Greeter/SayHello", "grpc", status, "", ""])
            .snapshot()
            .count
    };
    assert_eq!(hist("7"), 1);
    assert_eq!(hist("0"), 1);
}
