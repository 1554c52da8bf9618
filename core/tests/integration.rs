//! Full account lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives register → login →
//! set avatar → get avatar → logout through `ChainExecutor` over real HTTP
//! using ureq. The login token reaches later steps only through the chain
//! context.

use account_core::{
    execute, AccountClient, ApiError, ChainExecutor, ChainState, ContentDefect, Flow, HttpMethod,
    HttpRequest, HttpResponse, Operation, Transporter,
};
use async_trait::async_trait;

/// Execute `HttpRequest` values with ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data, letting the core interpret the status.
/// ureq blocks, so each call runs on tokio's blocking pool.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

fn call(agent: &ureq::Agent, req: &HttpRequest) -> Result<HttpResponse, ureq::Error> {
    let mut response = match (req.method, &req.body) {
        (HttpMethod::Get, _) => {
            let mut builder = agent.get(&req.path);
            for (key, value) in &req.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }
            builder.call()
        }
        (HttpMethod::Post, body) => {
            let mut builder = agent.post(&req.path);
            for (key, value) in &req.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }
            builder.send(body.as_deref().unwrap_or_default().as_bytes())
        }
        (HttpMethod::Put, body) => {
            let mut builder = agent.put(&req.path);
            for (key, value) in &req.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }
            builder.send(body.as_deref().unwrap_or_default().as_bytes())
        }
    }?;

    let status = response.status().as_u16();
    let headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    let body = response.body_mut().read_to_vec()?;
    let mut out = HttpResponse::new(status, body);
    out.headers = headers;
    Ok(out)
}

#[async_trait]
impl Transporter for UreqTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || call(&agent, &request))
            .await
            .map_err(|e| ApiError::TransportError(e.to_string()))?
            .map_err(|e| ApiError::TransportError(e.to_string()))
    }
}

fn start_mock_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[derive(Debug, Clone, Default)]
struct Session {
    object_id: String,
    token: String,
    avatar_url: String,
    defects: Vec<ContentDefect>,
}

const AVATAR: &str = "https://mydomain.bg/avatar.jpg";

#[tokio::test(flavor = "multi_thread")]
async fn account_lifecycle_chain() {
    let base_url = start_mock_server();
    let client = AccountClient::new(&base_url);

    let mut chain = ChainExecutor::new(client.clone(), UreqTransport::new());
    chain
        // Step 0: register.
        .then(|outcome, session: Session, chainer| {
            let Ok(result) = outcome else {
                return Flow::Abort(session);
            };
            if !result.is_valid() {
                return Flow::Abort(session);
            }
            chainer.add(Operation::login("lifecycle@mail.bg", "pw123456"));
            Flow::Continue(session)
        })
        // Step 1: login.
        .then(|outcome, mut session, chainer| {
            let Some(login) = outcome.ok().and_then(|r| r.login().cloned()) else {
                return Flow::Abort(session);
            };
            session.object_id = login.object_id;
            session.token = login.user_token;
            chainer.add(Operation::set_user_avatar(
                session.object_id.clone(),
                session.token.clone(),
                AVATAR,
            ));
            Flow::Continue(session)
        })
        // Step 2: set avatar.
        .then(|outcome, mut session, chainer| {
            let Ok(result) = outcome else {
                return Flow::Abort(session);
            };
            session.defects.extend(result.defects());
            chainer.add(Operation::get_user_avatar(
                session.object_id.clone(),
                session.token.clone(),
            ));
            Flow::Continue(session)
        })
        // Step 3: get avatar.
        .then(|outcome, mut session, chainer| {
            let Some(avatar) = outcome.ok().and_then(|r| r.get_avatar().cloned()) else {
                return Flow::Abort(session);
            };
            session.avatar_url = avatar.avatar_url;
            chainer.add(Operation::logout(session.token.clone()));
            Flow::Continue(session)
        })
        // Step 4: logout.
        .then(|outcome, session, _| Flow::from_bool(outcome.is_ok(), session));

    let report = chain
        .start(Session::default(), |_, chainer| {
            chainer.add(Operation::register("lifecycle@mail.bg", "pw123456", "Lifecycle"));
        })
        .await
        .unwrap();

    assert_eq!(report.state, ChainState::Completed { steps: 5 });
    assert!(!report.context.token.is_empty());
    assert_eq!(report.context.avatar_url, AVATAR);
    assert!(report.context.defects.is_empty(), "{:?}", report.context.defects);

    // The session is gone after the chain's logout.
    let err = execute(&client, &UreqTransport::new(), &Operation::logout(report.context.token))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 401, .. }));
}

#[tokio::test]
async fn transport_records_response_headers() {
    let base_url = start_mock_server();
    let client = AccountClient::new(&base_url);
    let request = client
        .compile(&Operation::register("headers@mail.bg", "pw123456", "Headers"))
        .unwrap();

    let response = UreqTransport::new().send(&request).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Type"), Some("application/json"));
    assert!(client
        .parse(&Operation::register("headers@mail.bg", "pw123456", "Headers"), response)
        .unwrap()
        .is_valid());
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_login_aborts_before_avatar_calls() {
    let base_url = start_mock_server();
    let mut chain = ChainExecutor::new(AccountClient::new(&base_url), UreqTransport::new());
    chain
        .then(|outcome, attempts: usize, chainer| match outcome {
            Ok(result) => {
                let login = result.login().cloned().unwrap_or_default();
                chainer.add(Operation::get_user_avatar(login.object_id, login.user_token));
                Flow::Continue(attempts + 1)
            }
            Err(_) => Flow::Abort(attempts + 1),
        })
        .then(|_, attempts, _| Flow::Continue(attempts + 1));

    let report = chain
        .start(0, |_, chainer| {
            chainer.add(Operation::login("nobody@mail.bg", "pw123456"));
        })
        .await
        .unwrap();

    assert_eq!(report.state, ChainState::Aborted { step: 0 });
    assert_eq!(report.context, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = AccountClient::new(&format!("http://{addr}"));
    let err = execute(&client, &UreqTransport::new(), &Operation::logout("TOK"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::TransportError(_)));
}
