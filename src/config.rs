#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,

    /// `User-Agent` presented to SoundCloud.
    ///
    /// The public API endpoints serve the web player, so requests are sent
    /// with a browser identity instead of one derived from the crate name.
    pub user_agent: String,
}

impl Config {
    /// Browser identity the resolve endpoints are known to accept.
    const BROWSER_USER_AGENT: &'static str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/51.0.2704.103 Safari/537.36";

    #[must_use]
    pub fn new() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_owned(),
            app_version: env!("CARGO_PKG_VERSION").to_owned(),
            user_agent: Self::BROWSER_USER_AGENT.to_owned(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
