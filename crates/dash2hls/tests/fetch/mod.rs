use dash2hls::{fetch::read_local, Dash2HlsError, ProfileSet, Url};
use reqwest::Client;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const SINGLE_TIMELINE: &str = include_str!("../fixtures/dash/single-timeline.mpd");

async fn setup_mock_server(body: &str) -> (String, MockServer) {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vod/manifest.mpd"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    (format!("{}/vod/manifest.mpd", mock_server.uri()), mock_server)
}

#[tokio::test]
async fn test_from_remote() -> anyhow::Result<()> {
    let (manifest_uri, server) = setup_mock_server(SINGLE_TIMELINE).await;

    let profiles = ProfileSet::from_remote(&Client::new(), &manifest_uri.parse()?).await?;
    let profile = profiles.get("0")?;
    assert_eq!(profile.fragments.len(), 4);
    assert_eq!(
        profile.fragments[0].media,
        format!("{}/vod/seg-1-2000.m4s", server.uri())
    );

    Ok(())
}

#[tokio::test]
async fn test_from_remote_not_found() -> anyhow::Result<()> {
    let (_, server) = setup_mock_server(SINGLE_TIMELINE).await;
    let missing: Url = format!("{}/missing.mpd", server.uri()).parse()?;

    let result = ProfileSet::from_remote(&Client::new(), &missing).await;
    match result {
        Err(error @ Dash2HlsError::HttpError(_)) => {
            assert!(error.is_unavailable());
            assert!(matches!(error, Dash2HlsError::HttpError(status) if status.as_u16() == 404));
        }
        other => panic!("unexpected result: {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_from_local() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join(format!("dash2hls-{}.mpd", std::process::id()));
    tokio::fs::write(&path, SINGLE_TIMELINE).await?;

    let base: Url = "https://cdn.example.com/title/manifest.mpd".parse()?;
    let result = ProfileSet::from_local(&path, Some(&base)).await;
    tokio::fs::remove_file(&path).await?;

    let profiles = result?;
    assert_eq!(
        profiles.media_urls("0")?[0],
        "https://cdn.example.com/title/seg-1-2000.m4s"
    );

    Ok(())
}

#[tokio::test]
async fn test_read_local_invalid_path() {
    let result = read_local("/nonexistent/dash2hls/manifest.mpd").await;
    assert!(matches!(result, Err(Dash2HlsError::InvalidPath(_))));
    assert!(result.unwrap_err().is_unavailable());

    let result = read_local(std::env::temp_dir()).await;
    assert!(matches!(result, Err(Dash2HlsError::InvalidPath(_))));
}
