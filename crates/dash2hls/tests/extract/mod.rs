use std::collections::HashSet;

use dash2hls::{ByteRange, Dash2HlsError, MediaKind, ProfileSet};

use crate::{source, AssertWrapper};

const SINGLE_TIMELINE: &str = include_str!("../fixtures/dash/single-timeline.mpd");
const MULTI_PERIOD: &str = include_str!("../fixtures/dash/multi-period.mpd");
const SEGMENT_BASE: &str = include_str!("../fixtures/dash/segment-base.mpd");
const REPRESENTATION_DRM: &str = include_str!("../fixtures/dash/representation-drm.mpd");

#[test]
fn test_single_timeline() -> anyhow::Result<()> {
    let profiles = ProfileSet::load(SINGLE_TIMELINE, Some(&source()))?;
    assert_eq!(profiles.len(), 1);

    let profile = profiles.get("0")?;
    assert_eq!(profile.bandwidth, 500000);
    assert_eq!(profile.mime_type, "video/mp4");
    assert_eq!(
        profile.kind,
        MediaKind::Video {
            width: 1280,
            height: 720,
            frame_rate: 29.97,
            sar: "1:1".to_string(),
        }
    );
    assert!(profile.drm.is_empty());

    // $Time$ = S@t (default 0) + S@d, shared by all repeats of the entry,
    // so the second entry yields 0 + 2000 rather than a running 4000
    assert_eq!(
        profile.media_urls(),
        vec![
            "https://example.com/vod/seg-1-2000.m4s",
            "https://example.com/vod/seg-2-2000.m4s",
            "https://example.com/vod/seg-3-2000.m4s",
            "https://example.com/vod/seg-4-2000.m4s",
        ]
    );
    assert!(profile.fragments.iter().all(|f| f.extinf == "2.000"));
    assert!(profile.fragments.iter().all(|f| f.range.is_full()));

    Ok(())
}

#[test]
fn test_relative_template_without_source() {
    let result = ProfileSet::load(SINGLE_TIMELINE, None);
    assert!(matches!(result, Err(Dash2HlsError::MissingRemoteUrl(_))));
}

#[test]
fn test_multi_period_merge() -> anyhow::Result<()> {
    let profiles = ProfileSet::load(MULTI_PERIOD, Some(&source()))?;

    // the text track is skipped and periods share representation ids
    let ids: Vec<_> = profiles.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["video-1080", "video-720", "audio-en"]);
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());

    let video = profiles.get("video-1080")?;
    assert_eq!(
        video.media_urls(),
        vec![
            "https://example.com/vod/video-1080/init.mp4",
            "https://example.com/vod/video-1080/360000.m4s",
            "https://example.com/vod/video-1080/360000.m4s",
            "https://example.com/vod/video-1080/990000.m4s",
        ]
    );
    let extinfs: Vec<_> = video.fragments.iter().map(|f| f.extinf.as_str()).collect();
    assert_eq!(extinfs, vec!["90.000", "4.000", "4.000", "3.000"]);
    assert_eq!(video.codecs.as_deref(), Some("avc1.640028"));
    assert_eq!(video.quality(), "1920x1080");
    match &video.kind {
        MediaKind::Video { frame_rate, .. } => assert_eq!(*frame_rate, 25.0),
        kind => panic!("unexpected kind {kind:?}"),
    }

    match &profiles.get("video-720")?.kind {
        MediaKind::Video { frame_rate, .. } => assert_eq!(*frame_rate, 50.0),
        kind => panic!("unexpected kind {kind:?}"),
    }

    let audio = profiles.get("audio-en")?;
    assert!(audio.is_audio());
    assert_eq!(audio.mime_type, "audio/m4a");
    assert_eq!(audio.quality(), "48000");
    assert_eq!(
        audio.media_urls(),
        vec![
            "https://example.com/vod/audio/init.mp4",
            "https://example.com/vod/audio/00001.m4s",
            "https://example.com/vod/audio/00002.m4s",
            "https://example.com/vod/audio/00003.m4s",
        ]
    );

    Ok(())
}

#[test]
fn test_adaptation_set_protection() -> anyhow::Result<()> {
    let profiles = ProfileSet::load(MULTI_PERIOD, Some(&source()))?;
    let drm = &profiles.get("video-720")?.drm;

    assert_eq!(
        drm.kid.as_deref(),
        Some("0a1b2c3d-4e5f-6071-8293-a4b5c6d7e8f9")
    );
    assert_eq!(
        drm.widevine.as_deref(),
        Some("AAAAW3Bzc2gAAAAA7e+LqXnWSs6jyCfc1R0h7QAAADsIARIQ")
    );
    assert_eq!(
        drm.playready.as_deref(),
        Some("IAMAAAEAAQAWAzwAVwBSAE0ASABFAEEARABFAFIA")
    );
    assert_eq!(
        drm.license.as_deref(),
        Some("https://license.example.com/rightsmanager.asmx")
    );

    // the second period declares no protection, the first one is kept
    assert_eq!(profiles.get("video-1080")?.drm, *drm);
    assert!(profiles.get("audio-en")?.drm.is_empty());

    Ok(())
}

#[test]
fn test_representation_protection_and_base_url() -> anyhow::Result<()> {
    // the manifest-level BaseURL is absolute, no source url needed
    let profiles = ProfileSet::load(REPRESENTATION_DRM, None)?;

    let v0 = profiles.get("v0")?;
    assert_eq!(
        v0.drm.kid.as_deref(),
        Some("6c9f7a10-2be6-4c01-af2d-ca78df1743cb")
    );
    assert_eq!(v0.drm.widevine, None);
    assert_eq!(v0.drm.playready.as_deref(), Some("UExBWVJFQURZ"));
    assert_eq!(
        v0.media_urls(),
        vec![
            "https://vod.example.net/title/v0/init.mp4",
            "https://vod.example.net/title/v0/10.m4s?bw=3000000",
            "https://vod.example.net/title/v0/11.m4s?bw=3000000",
            "https://vod.example.net/title/v0/12.m4s?bw=3000000",
        ]
    );
    assert_eq!(v0.fragments[0].extinf, "1.000");

    // no protection on the representation, the adaptation set's applies
    let v1 = profiles.get("v1")?;
    assert_eq!(
        v1.drm.kid.as_deref(),
        Some("11111111-1111-1111-1111-111111111111")
    );
    assert_eq!(v1.media_urls(), vec!["https://cdn2.example.net/v1/1.m4s"]);

    // v1's BaseURL does not leak into its sibling
    let v2 = profiles.get("v2")?;
    assert_eq!(v2.media_urls(), vec!["https://vod.example.net/title/v2/1.m4s"]);

    Ok(())
}

#[test]
fn test_segment_base() -> anyhow::Result<()> {
    let profiles = ProfileSet::load(SEGMENT_BASE, Some(&source()))?;

    let video = profiles.get("1")?;
    assert_eq!(video.fragments.len(), 1);
    assert_eq!(video.fragments[0].range, ByteRange::new(0, Some(999)));
    assert_eq!(video.fragments[0].range.to_string(), "0-999");
    // extinf = (indexRange end - start) / 1000, so 0-999 yields 0.999
    assert_eq!(video.fragments[0].extinf, "0.999");
    assert_eq!(video.fragments[0].media, "https://example.com/vod/video-720.mp4");

    let with_init = profiles.get("2")?;
    assert_eq!(with_init.fragments[0].range.to_string(), "0-1937");
    assert_eq!(with_init.fragments[0].extinf, "1.075");
    assert_eq!(
        with_init.fragments[0].media,
        "https://cdn.example.org/media/video-480.mp4"
    );

    let audio = profiles.get("3")?;
    assert!(!audio.start_with_sap);
    assert_eq!(audio.mime_type, "audio/mp4");
    assert_eq!(audio.fragments[0].extinf, "0.691");

    Ok(())
}

#[test]
fn test_default_profile() {
    let profiles = ProfileSet::load(MULTI_PERIOD, Some(&source())).assert_success();
    assert_eq!(profiles.default_profile().assert_success().id, "video-1080");

    ProfileSet::default().default_profile().assert_error();
}

#[test]
fn test_unknown_profile() {
    let profiles = ProfileSet::load(SINGLE_TIMELINE, Some(&source())).assert_success();
    assert!(matches!(
        profiles.get("42"),
        Err(Dash2HlsError::InvalidProfile(id)) if id == "42"
    ));
    profiles.build_playlist("42", None).assert_error();
    profiles.media_urls("42").assert_error();
}

#[test]
fn test_invalid_documents() {
    let cases = [
        "",
        "not xml at all",
        "<MPD><Period>",
        r#"<Period><AdaptationSet><Representation id="0"/></AdaptationSet></Period>"#,
        r#"<MPD><Period><AdaptationSet/></Period></MPD>"#,
        r#"<MPD><Period><AdaptationSet mimeType="video/mp4">
            <Representation bandwidth="1" width="1" height="1"/>
        </AdaptationSet></Period></MPD>"#,
        r#"<MPD><Period><AdaptationSet mimeType="video/mp4">
            <Representation id="0" width="1" height="1"/>
        </AdaptationSet></Period></MPD>"#,
        r#"<MPD><Period><AdaptationSet mimeType="video/mp4">
            <Representation id="0" bandwidth="1" width="1" height="1"/>
        </AdaptationSet></Period></MPD>"#,
    ];

    for case in cases {
        assert!(
            matches!(
                ProfileSet::load(case, Some(&source())),
                Err(Dash2HlsError::InvalidFileContent(_))
            ),
            "{case}"
        );
    }
}

#[test]
fn test_serialize_profiles() -> anyhow::Result<()> {
    let profiles = ProfileSet::load(SEGMENT_BASE, Some(&source()))?;
    let json = serde_json::to_value(&profiles)?;

    assert_eq!(json[0]["id"], "1");
    assert_eq!(json[0]["type"], "video");
    assert_eq!(json[0]["frameRate"], 24.0);
    assert_eq!(json[0]["fragments"][0]["range"], "0-999");
    assert_eq!(json[2]["type"], "audio");
    assert_eq!(json[2]["audioSamplingRate"], "44100");
    assert_eq!(json[2]["startWithSap"], false);

    Ok(())
}
