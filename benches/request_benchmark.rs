use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use webrouter::{request::Request, Context, HttpServer};

fn request_parse_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_parse");

    let requests = [
        (
            "simple",
            b"GET / HTTP/1.1\r\nHost: localhost:7878\r\n\r\n".as_slice(),
        ),
        (
            "browser",
            b"GET /order/detail/42?from=list&page=3 HTTP/1.1\r\n\
              Host: localhost:7878\r\n\
              User-Agent: Mozilla/5.0 (Windows NT 10.0; Win64; x64)\r\n\
              Accept: text/html,application/xhtml+xml\r\n\
              Accept-Encoding: gzip, deflate, br\r\n\
              \r\n"
                .as_slice(),
        ),
        (
            "json_body",
            b"POST /order HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: 21\r\n\r\n{\"id\":3,\"name\":\"pen\"}"
                .as_slice(),
        ),
    ];

    for (name, request) in requests.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), request, |b, request| {
            b.iter(|| Request::try_from(black_box(request), 0).unwrap());
        });
    }

    group.finish();
}

fn query_binding_benchmark(c: &mut Criterion) {
    let raw = b"GET /search?q=trie+router&page=2&tag=%E4%B8%AD&sort=desc HTTP/1.1\r\nHost: localhost\r\n\r\n";
    let request = Request::try_from(raw, 0).unwrap();

    c.bench_function("query_value", |b| {
        b.iter(|| {
            let mut ctx = Context::new(request.clone(), 0);
            black_box(ctx.query_value("q").into_string().unwrap());
            black_box(ctx.query_value("page").as_u64().unwrap());
        });
    });
}

fn dispatch_benchmark(c: &mut Criterion) {
    let mut server = HttpServer::default();
    server
        .get("/order/detail/:id", |ctx| {
            let id = ctx.path_value("id").as_u64().unwrap_or_default();
            ctx.resp_string(200, id.to_string());
        })
        .unwrap();
    let dispatcher = server.into_dispatcher();
    let request = Request::try_from(b"GET /order/detail/42 HTTP/1.1\r\nHost: localhost\r\n\r\n", 0).unwrap();

    c.bench_function("dispatch_param_route", |b| {
        b.iter(|| dispatcher.handle(black_box(request.clone()), 0).as_bytes());
    });
}

criterion_group!(
    benches,
    request_parse_benchmark,
    query_binding_benchmark,
    dispatch_benchmark
);
criterion_main!(benches);
