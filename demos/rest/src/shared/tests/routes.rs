use std::sync::Arc;

use http::Method;
use prost::Message as _;
use rama_rest::{Code, Context};

use crate::hello_world::{
    HelloReply, HelloRequest, RamaGreeter, greeter_rest_server::GreeterRestServiceDesc,
};

#[test]
fn greeter_route_table() {
    let desc = GreeterRestServiceDesc::<RamaGreeter>();
    assert_eq!(desc.service_name, "helloworld.Greeter");
    assert_eq!(desc.handler_type, "GreeterServer");

    let routes = desc
        .methods
        .iter()
        .map(|route| (route.method_name, route.method.clone(), route.path, route.deprecated))
        .collect::<Vec<_>>();
    assert_eq!(
        routes,
        vec![
            ("SayHello", Method::GET, "/v1/hello", false),
            ("SayHello", Method::POST, "/v1/hello/{name}", false),
            ("SayHelloOld", Method::GET, "/v0/hello", true),
        ]
    );
    assert_eq!(desc.methods[0].desc, "Sends a greeting.");
    assert_eq!(desc.methods[2].desc, "Sends a greeting the old way.");

    let streams = desc
        .streams
        .iter()
        .map(|stream| (stream.stream_name, stream.client_streams, stream.server_streams))
        .collect::<Vec<_>>();
    assert_eq!(
        streams,
        vec![("ListItems", false, true), ("Collect", true, false)]
    );
}

#[tokio::test]
async fn serve_unary_binds_body_and_path() {
    let desc = GreeterRestServiceDesc::<RamaGreeter>();
    let srv = Arc::new(RamaGreeter::default());

    let reply = desc
        .serve_unary(
            Context::new(),
            srv.clone(),
            None,
            &Method::POST,
            "/v1/hello/glen",
        )
        .await
        .unwrap()
        .downcast::<HelloReply>()
        .unwrap();
    assert_eq!(reply.message, "Hello glen!");

    let body = HelloRequest {
        name: "body".to_owned(),
    }
    .encode_to_vec();
    let reply = desc
        .serve_unary(
            Context::new().with_body(body),
            srv.clone(),
            None,
            &Method::GET,
            "/v0/hello",
        )
        .await
        .unwrap()
        .downcast::<HelloReply>()
        .unwrap();
    assert_eq!(reply.message, "Hi body.");

    let err = desc
        .serve_unary(Context::new(), srv, None, &Method::DELETE, "/v1/hello")
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn malformed_body_is_an_invalid_argument() {
    let err = GreeterRestServiceDesc::<RamaGreeter>()
        .serve_unary(
            Context::new().with_body(vec![0x0a, 0xff]),
            Arc::new(RamaGreeter::default()),
            None,
            &Method::GET,
            "/v1/hello",
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
}
