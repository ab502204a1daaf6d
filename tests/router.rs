use http_types::{Method, Request, Response, StatusCode, Url};
use wow_router::{Application, Context, Options, RouteError};

async fn show(ctx: Context) -> wow_router::Result<Response> {
    let mut res = Response::new(StatusCode::Ok);
    let params: Vec<String> = ctx
        .params()
        .iter()
        .map(|p| format!("{}={}", p.key, p.value))
        .collect();
    res.set_body(format!(
        "{} {}",
        ctx.request().method(),
        params.join("&")
    ));
    Ok(res)
}

async fn fallback(ctx: Context) -> wow_router::Result<Response> {
    let mut res = Response::new(StatusCode::NotFound);
    res.set_body(format!("fallback {}", ctx.request().url().path()));
    Ok(res)
}

fn request(method: Method, path: &str) -> Request {
    Request::new(method, Url::parse(&format!("http://localhost{}", path)).unwrap())
}

fn header(res: &Response, name: &str) -> Option<String> {
    res.header(name).map(|values| values.last().as_str().to_string())
}

fn app() -> Application {
    let mut app = Application::new();
    app.router_mut()
        .get("/api/:type/:ID", show)
        .unwrap()
        .post("/api/:type/:ID", show)
        .unwrap()
        .get(r"/num/:id(^\d+$)", show)
        .unwrap()
        .put("/trash/:resource/:ID+:undelete", show)
        .unwrap()
        .get("/files/:filepath*", show)
        .unwrap()
        .get("/foo", show)
        .unwrap();
    app
}

#[async_std::test]
async fn dispatches_with_params() -> wow_router::Result<()> {
    let app = app();

    let mut res = app.respond(request(Method::Get, "/api/user/123")).await?;
    assert_eq!(res.status(), StatusCode::Ok);
    assert_eq!(res.body_string().await?, "GET type=user&ID=123");

    let mut res = app.respond(request(Method::Post, "/api/user/123")).await?;
    assert_eq!(res.body_string().await?, "POST type=user&ID=123");
    Ok(())
}

#[async_std::test]
async fn constrained_segments() -> wow_router::Result<()> {
    let app = app();

    let mut res = app.respond(request(Method::Get, "/num/42")).await?;
    assert_eq!(res.body_string().await?, "GET id=42");
    let res = app.respond(request(Method::Get, "/num/abc")).await?;
    assert_eq!(res.status(), StatusCode::NotImplemented);

    let mut res = app
        .respond(request(Method::Put, "/trash/file/123:undelete"))
        .await?;
    assert_eq!(res.body_string().await?, "PUT resource=file&ID=123");

    let mut res = app.respond(request(Method::Get, "/files/a/b/c")).await?;
    assert_eq!(res.body_string().await?, "GET filepath=a/b/c");
    Ok(())
}

#[async_std::test]
async fn unmatched_path_is_not_implemented() -> wow_router::Result<()> {
    let app = app();

    let mut res = app.respond(request(Method::Get, "/nowhere")).await?;
    assert_eq!(res.status(), StatusCode::NotImplemented);
    assert_eq!(res.body_string().await?, "\"/nowhere\" not implemented");
    Ok(())
}

#[async_std::test]
async fn method_not_allowed_lists_methods() -> wow_router::Result<()> {
    let app = app();

    let res = app.respond(request(Method::Delete, "/api/user/1")).await?;
    assert_eq!(res.status(), StatusCode::MethodNotAllowed);
    assert_eq!(header(&res, "Allow").as_deref(), Some("GET, POST"));
    Ok(())
}

#[async_std::test]
async fn automatic_options() -> wow_router::Result<()> {
    let app = app();

    let res = app.respond(request(Method::Options, "/api/user/1")).await?;
    assert_eq!(res.status(), StatusCode::NoContent);
    assert_eq!(header(&res, "Allow").as_deref(), Some("GET, POST"));
    Ok(())
}

#[async_std::test]
async fn redirects() -> wow_router::Result<()> {
    let app = app();

    let res = app.respond(request(Method::Get, "/foo/?page=2")).await?;
    assert_eq!(res.status(), StatusCode::MovedPermanently);
    assert_eq!(header(&res, "Location").as_deref(), Some("/foo?page=2"));

    let res = app.respond(request(Method::Post, "/api//user/1")).await?;
    assert_eq!(res.status(), StatusCode::TemporaryRedirect);
    assert_eq!(header(&res, "Location").as_deref(), Some("/api/user/1"));
    Ok(())
}

#[async_std::test]
async fn fallback_replaces_501_and_405() -> wow_router::Result<()> {
    let mut app = app();
    app.router_mut().otherwise(fallback);

    let mut res = app.respond(request(Method::Get, "/nowhere")).await?;
    assert_eq!(res.status(), StatusCode::NotFound);
    assert_eq!(res.body_string().await?, "fallback /nowhere");

    let res = app.respond(request(Method::Delete, "/foo")).await?;
    assert_eq!(res.status(), StatusCode::NotFound);
    Ok(())
}

#[async_std::test]
async fn case_sensitive_router() -> wow_router::Result<()> {
    let mut app = Application::with_options(Options {
        ignore_case: false,
        ..Options::default()
    });
    app.router_mut().get("/Users", show).unwrap();

    let res = app.respond(request(Method::Get, "/Users")).await?;
    assert_eq!(res.status(), StatusCode::Ok);
    let res = app.respond(request(Method::Get, "/users")).await?;
    assert_eq!(res.status(), StatusCode::NotImplemented);
    Ok(())
}

#[test]
fn registration_errors_surface_at_startup() {
    let mut app = Application::new();
    let router = app.router_mut();

    assert!(matches!(
        router.get("/a//b", show),
        Err(RouteError::MultipleSlashes(_))
    ));
    router.get("/files/:path*", show).unwrap();
    assert!(matches!(
        router.get("/files/:path*/more", show),
        Err(RouteError::AfterWildcard(_))
    ));
    assert!(matches!(
        router.get("/files/:other*", show),
        Err(RouteError::ConflictingWildcard(_, _))
    ));
    assert!(matches!(
        router.get("/files/:path*", show),
        Err(RouteError::DuplicateHandler { .. })
    ));
}

#[test]
fn endpoints_are_introspectable() {
    let app = app();
    let patterns: Vec<&str> = app
        .router()
        .trie()
        .endpoints()
        .into_iter()
        .map(|node| node.pattern())
        .collect();
    assert_eq!(
        patterns,
        vec![
            "/api/:type/:ID",
            r"/num/:id(^\d+$)",
            "/trash/:resource/:ID+:undelete",
            "/files/:filepath*",
            "/foo",
        ]
    );
}

#[async_std::test]
async fn matches_decoded_paths() -> wow_router::Result<()> {
    let mut app = Application::new();
    app.router_mut()
        .get("/files/:filepath*", show)
        .unwrap()
        .get("/café", show)
        .unwrap();

    let mut res = app
        .respond(request(Method::Get, "/files/my doc.txt"))
        .await?;
    assert_eq!(res.body_string().await?, "GET filepath=my doc.txt");

    let res = app.respond(request(Method::Get, "/café")).await?;
    assert_eq!(res.status(), StatusCode::Ok);

    let res = app.respond(request(Method::Get, "/café/")).await?;
    assert_eq!(res.status(), StatusCode::MovedPermanently);
    assert_eq!(header(&res, "Location").as_deref(), Some("/caf%C3%A9"));
    Ok(())
}
