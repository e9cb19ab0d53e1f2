use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;
use clap::Parser;
use dash2hls::{ExplicitKey, Profile, ProfileSet, Url};
use fake_user_agent::get_chrome_rua;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, ClientBuilder,
};

#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Dash2HlsArgs {
    /// Debug output
    #[clap(long, alias = "debug")]
    verbose: bool,

    /// List available profiles and exit
    #[clap(short, long)]
    list: bool,

    /// Print the profile list as JSON. Only takes effect with --list.
    #[clap(long)]
    json: bool,

    /// Id of the profile to convert
    ///
    /// Defaults to the video profile with the highest bandwidth.
    #[clap(short, long)]
    profile: Option<String>,

    /// Clear key used to decrypt the stream
    ///
    /// Format: <kid>:<key> in hex. The playlist advertises SAMPLE-AES-CTR with this key
    /// instead of the license url found in the manifest.
    #[clap(long, env = "DASH2HLS_KEY")]
    key: Option<String>,

    /// Print fragment urls instead of the playlist
    #[clap(long)]
    urls: bool,

    /// Url of the manifest, used to resolve relative segment urls of a local manifest
    ///
    /// Segment urls are resolved against the directory of this url, so either pass the
    /// manifest's original url or a directory ending with a slash.
    #[clap(long)]
    base_url: Option<Url>,

    /// Cookies used to fetch the manifest
    #[clap(long)]
    cookies: Option<String>,

    /// HTTP Header used to fetch the manifest
    ///
    /// Custom header. eg. "User-Agent: xxxxx". This option will override --cookies.
    #[clap(short = 'H', long)]
    headers: Vec<String>,

    /// User agent used to fetch the manifest. Defaults to a random Chrome UA.
    #[clap(long)]
    user_agent: Option<String>,

    /// Request timeout in seconds
    #[clap(long, default_value = "60")]
    timeout: u64,

    /// Output file path. Prints to stdout when omitted.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Manifest url or local path
    input: String,
}

impl Dash2HlsArgs {
    fn client(&self) -> anyhow::Result<Client> {
        let mut headers = HeaderMap::new();
        if let Some(cookies) = &self.cookies {
            headers.insert(
                reqwest::header::COOKIE,
                HeaderValue::from_str(cookies).context("Invalid cookie")?,
            );
        }

        for header in &self.headers {
            let (key, value) = header
                .split_once(':')
                .with_context(|| format!("Invalid header: {header}"))?;
            headers.insert(
                HeaderName::from_str(key.trim()).context("Invalid header name")?,
                HeaderValue::from_str(value.trim()).context("Invalid header value")?,
            );
        }

        Ok(ClientBuilder::new()
            .default_headers(headers)
            .user_agent(
                self.user_agent
                    .clone()
                    .unwrap_or_else(|| get_chrome_rua().to_string()),
            )
            .timeout(Duration::from_secs(self.timeout))
            .build()?)
    }

    fn is_remote(&self) -> bool {
        self.input.starts_with("http://") || self.input.starts_with("https://")
    }

    async fn load(&self) -> anyhow::Result<ProfileSet> {
        let result = if self.is_remote() {
            let url = Url::parse(&self.input)?;
            ProfileSet::from_remote(&self.client()?, &url).await
        } else {
            ProfileSet::from_local(&self.input, self.base_url.as_ref()).await
        };

        result.map_err(|error| {
            if error.is_unavailable() {
                log::error!("Unable to read manifest from {}", self.input);
            }
            error.into()
        })
    }

    fn write(&self, content: &str) -> anyhow::Result<()> {
        match &self.output {
            Some(output) => {
                if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(output, content)?;
                log::info!("Saved to {}", output.display());
            }
            None => println!("{content}"),
        }
        Ok(())
    }
}

fn print_profiles(profiles: &ProfileSet) {
    println!(
        "{:<12} {:<14} {:<12} {:<12} {:<24} {}",
        "Id", "Type", "Bandwidth", "Quality", "Codecs", "Encrypted"
    );
    for profile in profiles {
        let Profile {
            id,
            mime_type,
            bandwidth,
            codecs,
            drm,
            ..
        } = profile;
        println!(
            "{:<12} {:<14} {:<12} {:<12} {:<24} {}",
            id,
            mime_type,
            bandwidth,
            profile.quality(),
            codecs.as_deref().unwrap_or_default(),
            if drm.is_empty() { "no" } else { "yes" }
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Dash2HlsArgs::parse();

    let mut logger = pretty_env_logger::formatted_builder();
    logger.filter_level(if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }
    logger.init();

    let key = args
        .key
        .as_deref()
        .map(ExplicitKey::from_str)
        .transpose()?;
    let profiles = args.load().await?;

    if args.list {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&profiles)?);
        } else {
            print_profiles(&profiles);
        }
        return Ok(());
    }

    let profile_id = match &args.profile {
        Some(id) => id.clone(),
        None => profiles
            .default_profile()
            .map(|profile| profile.id.clone())
            .context("The manifest contains no playable profile.")?,
    };
    log::debug!("Selected profile {profile_id}");

    let content = if args.urls {
        profiles.media_urls(&profile_id)?.join("\n")
    } else {
        profiles.build_playlist(&profile_id, key.as_ref())?
    };
    args.write(&content)
}
