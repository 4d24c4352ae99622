use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in shh.
#[derive(Debug, Error)]
pub enum ShhError {
    // --- Usage errors ---
    #[error("Bad arguments: {0}")]
    BadArgs(String),

    // --- Manifest / state errors ---
    #[error("Missing .shh manifest, run `shh init`")]
    ManifestNotFound(PathBuf),

    #[error("Manifest already exists at {0}")]
    ManifestAlreadyExists(PathBuf),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("User {0:?} is not a user in the project, try `shh add-user {0} $PUBKEY`")]
    UnknownUser(String),

    #[error("Secret '{0}' not found")]
    SecretNotFound(String),

    #[error("No secrets matching '{0}' which you can access")]
    NoAccessibleSecrets(String),

    #[error("Multiple secrets match '{0}', name one of them instead of *")]
    MultipleMatches(String),

    #[error("Keys already exist at {0}, run `shh rotate` to change keys")]
    KeysAlreadyExist(PathBuf),

    #[error("No keys found at {0}, run `shh gen-keys`")]
    KeysNotFound(PathBuf),

    // --- Crypto errors ---
    #[error("Malformed ciphertext: encrypted secret is too short")]
    MalformedCiphertext,

    #[error("Unable to unwrap secret key, wrong key or corrupted data")]
    UnwrapFailed,

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Auth errors ---
    #[error("Wrong password")]
    WrongPassword,

    #[error("Password unavailable: {0}")]
    PasswordUnavailable(String),

    #[error("Password daemon unreachable at {0}, run `shh serve`")]
    DaemonUnreachable(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Config file error: {0}")]
    ConfigError(String),

    #[error("Editor error: {0}")]
    EditorError(String),

    #[error("Daemon error: {0}")]
    DaemonError(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    // --- Context ---
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ShhError>,
    },
}

/// Broad category of a [`ShhError`], used to decide how it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    State,
    Crypto,
    Io,
    Auth,
}

impl ShhError {
    /// The category this error belongs to, looking through context wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadArgs(_) => ErrorKind::Usage,

            Self::ManifestNotFound(_)
            | Self::ManifestAlreadyExists(_)
            | Self::InvalidManifest(_)
            | Self::UnknownUser(_)
            | Self::SecretNotFound(_)
            | Self::NoAccessibleSecrets(_)
            | Self::MultipleMatches(_)
            | Self::KeysAlreadyExist(_)
            | Self::KeysNotFound(_) => ErrorKind::State,

            Self::MalformedCiphertext
            | Self::UnwrapFailed
            | Self::InvalidPublicKey(_)
            | Self::EncryptionFailed(_)
            | Self::KeyGenerationFailed(_)
            | Self::KeyDerivationFailed(_) => ErrorKind::Crypto,

            Self::WrongPassword
            | Self::PasswordUnavailable(_)
            | Self::DaemonUnreachable(_) => ErrorKind::Auth,

            Self::Io(_)
            | Self::SerializationError(_)
            | Self::ConfigError(_)
            | Self::EditorError(_)
            | Self::DaemonError(_)
            | Self::CommandFailed(_) => ErrorKind::Io,

            Self::Context { source, .. } => source.kind(),
        }
    }

    /// The innermost error, with all context wrappers removed.
    pub fn root(&self) -> &ShhError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Attach a description of the failing step to an error.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<ShhError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ShhError::Context {
            context: context.into(),
            source: Box::new(e.into()),
        })
    }
}

/// Convenience type alias for shh results.
pub type Result<T> = std::result::Result<T, ShhError>;
