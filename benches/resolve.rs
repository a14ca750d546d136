use agentnet::{Agent, BoxError, ClientRequest, Connection, RequestOptions};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use http::Method;
use tokio::runtime::Runtime;
use url::Url;

fn duplex_socket() -> Connection {
    let (client, _server) = tokio::io::duplex(64);
    Connection::socket(client)
}

fn bench_agent(c: &mut Criterion, rt: &Runtime, name: &str, agent: &Agent) {
    let req = &ClientRequest::new(Method::GET, Url::parse("http://127.0.0.1/foo").unwrap());
    let raw = &RequestOptions::new().host("127.0.0.1").port(8080);

    c.bench_function(name, |b| {
        b.to_async(rt)
            .iter(move || async move { black_box(agent.connect(req, raw).await.unwrap()) })
    });
}

/// Resolution overhead with in-memory sockets, no network I/O.
fn bench_resolution(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let sync_agent = Agent::from_fn(|_req, _opts| Ok(duplex_socket()));
    bench_agent(c, &rt, "resolve_sync", &sync_agent);

    let pending_agent = Agent::from_fn(|_req, _opts| {
        Ok(Connection::pending(async { Ok::<_, BoxError>(duplex_socket()) }))
    });
    bench_agent(c, &rt, "resolve_pending", &pending_agent);

    let mut chain = Agent::from_fn(|_req, _opts| Ok(duplex_socket()));
    for _ in 0..16 {
        let next = chain.clone();
        chain = Agent::from_fn(move |_req, _opts| Ok(Connection::delegate(next.clone())));
    }
    bench_agent(c, &rt, "resolve_chain_16", &chain);

    let raw = RequestOptions::new().host("example.com");
    c.bench_function("normalize", |b| b.iter(|| black_box(sync_agent.normalize(&raw))));
}

criterion_group!(benches, bench_resolution);
criterion_main!(benches);
