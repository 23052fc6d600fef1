use crate::config::Config;
use crate::error::{PollenError, Result};
use crate::models::{AccountInfo, GeneratedImage, GenerationRequest};
use crate::pollinations::PollinationsClient;
use crate::store::PreferenceStore;

/// What the session currently shows. Generation and error display are
/// mutually exclusive by construction, and a `Displaying` value owns its
/// image file; leaving that state drops the handle and deletes the file.
#[derive(Debug)]
pub enum SessionState {
    Idle,
    Generating { ticket: u64 },
    Displaying(GeneratedImage),
    ShowingError { message: String },
}

impl SessionState {
    pub fn is_generating(&self) -> bool {
        matches!(self, SessionState::Generating { .. })
    }

    pub fn displayed_image(&self) -> Option<&GeneratedImage> {
        match self {
            SessionState::Displaying(image) => Some(image),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionState::ShowingError { message } => Some(message),
            _ => None,
        }
    }
}

/// Everything one interactive run needs, carried explicitly: the API
/// client, the preference store, the current API key, the last account
/// fetch, and the display state.
///
/// Each generation gets a monotonically increasing ticket and a result
/// only commits while its ticket is still the live one, so a slow
/// response can never overwrite the display of a request issued later.
pub struct Session {
    client: PollinationsClient,
    store: PreferenceStore,
    state: SessionState,
    api_key: Option<String>,
    account: AccountInfo,
    last_ticket: u64,
}

impl Session {
    pub fn new(client: PollinationsClient, store: PreferenceStore) -> Self {
        Self {
            client,
            store,
            state: SessionState::Idle,
            api_key: None,
            account: AccountInfo::default(),
            last_ticket: 0,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut session = Self::new(
            PollinationsClient::new(config.pollinations.clone()),
            PreferenceStore::new(&config.preferences)?,
        );
        session.api_key = config.pollinations.trimmed_api_key().map(String::from);
        Ok(session)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn account(&self) -> &AccountInfo {
        &self.account
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn client(&self) -> &PollinationsClient {
        &self.client
    }

    /// Pull the stored key into the session. Store trouble is logged and
    /// the session starts keyless rather than failing.
    pub async fn load_preferences(&mut self) {
        match self.store.api_key().await {
            Ok(Some(key)) => self.api_key = Some(key),
            Ok(None) => {}
            Err(e) => log::warn!("Could not load preferences: {}", e),
        }
    }

    /// Run one generation to completion. A blank prompt is ignored
    /// outright; the display state does not change for it.
    pub async fn generate(&mut self, mut request: GenerationRequest) -> &SessionState {
        if request.trimmed_prompt().is_none() {
            return &self.state;
        }

        if request.api_key.is_none() {
            if let Some(key) = &self.api_key {
                request = request.with_api_key(key.clone());
            }
        }

        let ticket = self.begin_generation();
        match self.client.image().generate(request).await {
            Ok(image) => self.commit_image(ticket, image),
            Err(e) => self.commit_error(ticket, &e),
        };
        &self.state
    }

    /// Start a generation and hand back its ticket. Drivers running the
    /// request on their own task pair this with `commit_image` or
    /// `commit_error`.
    pub fn begin_generation(&mut self) -> u64 {
        self.last_ticket += 1;
        self.state = SessionState::Generating {
            ticket: self.last_ticket,
        };
        self.last_ticket
    }

    /// Commit a finished image. Returns false and drops the image (which
    /// deletes its file) when the ticket is no longer the live one.
    pub fn commit_image(&mut self, ticket: u64, image: GeneratedImage) -> bool {
        if !self.ticket_is_live(ticket) {
            log::debug!("Discarding stale image for ticket {}", ticket);
            return false;
        }
        self.state = SessionState::Displaying(image);
        true
    }

    /// Commit a failed generation, mapping the error to its user-facing
    /// message. The full error goes to the log; the state keeps only the
    /// display message. Stale tickets are discarded the same way as images.
    pub fn commit_error(&mut self, ticket: u64, error: &PollenError) -> bool {
        if !self.ticket_is_live(ticket) {
            log::debug!("Discarding stale error for ticket {}: {}", ticket, error);
            return false;
        }
        log::error!("Image generation failed: {}", error);
        self.state = SessionState::ShowingError {
            message: user_message(error),
        };
        true
    }

    fn ticket_is_live(&self, ticket: u64) -> bool {
        matches!(self.state, SessionState::Generating { ticket: live } if live == ticket)
    }

    /// Update the key in memory and write it through to the store. A
    /// blank key clears both the stored key and the account display.
    /// Callers wanting fresh account data follow up with
    /// [`refresh_account`](Self::refresh_account).
    pub async fn set_api_key(&mut self, key: Option<&str>) -> Result<()> {
        let normalized = key.map(str::trim).filter(|k| !k.is_empty());
        self.api_key = normalized.map(String::from);
        if self.api_key.is_none() {
            self.account = AccountInfo::default();
        }

        self.store.set_api_key(normalized).await.map(|_| ())
    }

    /// Re-fetch balance and profile with the current key, keeping prior
    /// values for whatever the fetch could not fill in. Without a key the
    /// account display resets to its defaults.
    pub async fn refresh_account(&mut self) {
        match &self.api_key {
            Some(key) => {
                let fetched = self.client.account().fetch(key).await;
                self.account = fetched.merged_over(&self.account);
            }
            None => self.account = AccountInfo::default(),
        }
    }
}

/// Map an error to the message shown to the user. Service-reported
/// messages pass through; transport trouble gets a generic retry prompt.
pub fn user_message(error: &PollenError) -> String {
    match error {
        PollenError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
        _ => "Failed to generate image. Please try again.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PollinationsConfig, PreferenceConfig};
    use crate::logger::{self, LoggerConfig};
    use crate::models::ImageHandle;
    use std::path::PathBuf;

    fn offline_session() -> Session {
        let config = Config::new()
            .with_pollinations(PollinationsConfig::new())
            .with_preferences(PreferenceConfig::new().ephemeral());
        Session::from_config(&config).unwrap()
    }

    fn test_image(seed: u32) -> GeneratedImage {
        GeneratedImage {
            handle: ImageHandle::from_bytes(b"not really a png", None).unwrap(),
            seed,
            model: "flux".to_string(),
        }
    }

    #[tokio::test]
    async fn commit_moves_generating_to_displaying() {
        let mut session = offline_session();
        let ticket = session.begin_generation();
        assert!(session.state().is_generating());

        assert!(session.commit_image(ticket, test_image(1)));
        assert_eq!(session.state().displayed_image().unwrap().seed, 1);
    }

    #[tokio::test]
    async fn stale_image_is_discarded_and_its_file_deleted() {
        let mut session = offline_session();
        let first = session.begin_generation();
        let second = session.begin_generation();

        let stale = test_image(1);
        let stale_path: PathBuf = stale.handle.path().to_path_buf();
        assert!(stale_path.exists());

        assert!(!session.commit_image(first, stale));
        assert!(!stale_path.exists());
        assert!(matches!(
            session.state(),
            SessionState::Generating { ticket } if *ticket == second
        ));

        assert!(session.commit_image(second, test_image(2)));
        assert_eq!(session.state().displayed_image().unwrap().seed, 2);
    }

    #[tokio::test]
    async fn stale_error_does_not_overwrite_newer_generation() {
        let mut session = offline_session();
        let first = session.begin_generation();
        let _second = session.begin_generation();

        let error = PollenError::Network("timed out".to_string());
        assert!(!session.commit_error(first, &error));
        assert!(session.state().is_generating());
    }

    #[tokio::test]
    async fn replacing_a_displayed_image_deletes_the_old_file() {
        let mut session = offline_session();
        let first = session.begin_generation();
        session.commit_image(first, test_image(1));
        let old_path = session
            .state()
            .displayed_image()
            .unwrap()
            .handle
            .path()
            .to_path_buf();
        assert!(old_path.exists());

        let second = session.begin_generation();
        session.commit_image(second, test_image(2));
        assert!(!old_path.exists());
    }

    #[tokio::test]
    async fn error_display_replaces_image_and_releases_it() {
        let mut session = offline_session();
        let first = session.begin_generation();
        session.commit_image(first, test_image(1));
        let image_path = session
            .state()
            .displayed_image()
            .unwrap()
            .handle
            .path()
            .to_path_buf();

        let second = session.begin_generation();
        let error = PollenError::Api {
            status: 502,
            message: "model overloaded".to_string(),
        };
        assert!(session.commit_error(second, &error));
        assert_eq!(session.state().error_message(), Some("model overloaded"));
        assert!(session.state().displayed_image().is_none());
        assert!(!image_path.exists());
    }

    // Sole test that installs the global logger; `log::set_logger` only
    // succeeds once per process.
    #[tokio::test]
    async fn failed_generation_writes_a_diagnostic_line() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("session.log");
        let config = LoggerConfig::new()
            .with_colors(false)
            .with_file_output(&log_path.display().to_string());
        assert!(logger::init_with_config(config).is_ok());

        let mut session = offline_session();
        let ticket = session.begin_generation();
        let error = PollenError::Network("connection reset".to_string());
        assert!(session.commit_error(ticket, &error));

        let logged = std::fs::read_to_string(&log_path).unwrap();
        assert!(logged.contains("Image generation failed"));
        assert!(logged.contains("connection reset"));
    }

    #[tokio::test]
    async fn blank_prompt_is_ignored_without_state_change() {
        let mut session = offline_session();
        session.generate(GenerationRequest::new("   ")).await;
        assert!(matches!(session.state(), SessionState::Idle));
    }

    #[tokio::test]
    async fn set_api_key_writes_through_and_clear_resets_account() {
        let mut session = offline_session();
        session.account = AccountInfo {
            display_name: Some("ada".into()),
            tier: Some("Pro".into()),
            balance: Some(10.0),
        };

        session.set_api_key(Some("  pk-123  ")).await.unwrap();
        assert_eq!(session.api_key(), Some("pk-123"));

        session.set_api_key(Some("")).await.unwrap();
        assert_eq!(session.api_key(), None);
        assert!(session.account().is_empty());
    }

    #[tokio::test]
    async fn load_preferences_picks_up_a_stored_key() {
        let mut session = offline_session();
        session.store.set_api_key(Some("pk-stored")).await.unwrap();

        session.load_preferences().await;
        assert_eq!(session.api_key(), Some("pk-stored"));
    }

    #[test]
    fn user_messages_pass_service_text_through() {
        let api = PollenError::Api {
            status: 400,
            message: "prompt rejected".to_string(),
        };
        assert_eq!(user_message(&api), "prompt rejected");

        let network = PollenError::Network("dns".to_string());
        assert_eq!(
            user_message(&network),
            "Failed to generate image. Please try again."
        );
    }
}
