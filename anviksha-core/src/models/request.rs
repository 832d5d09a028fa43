//! Analysis request types
//!
//! Created per user action and discarded once the pipeline resolves.
//! Nothing here is cached or persisted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Upload types the product declares acceptable
pub const ACCEPTED_UPLOAD_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Raw image bytes with their declared MIME type
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    mime_type: String,
}

impl ImagePayload {
    /// Wrap image bytes, rejecting empty payloads and non-image MIME types
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> crate::Result<Self> {
        let mime_type = mime_type.into().trim().to_ascii_lowercase();
        if bytes.is_empty() {
            return Err(crate::Error::InvalidImage("image is empty".to_string()));
        }
        if !mime_type.starts_with("image/") || mime_type.len() == "image/".len() {
            return Err(crate::Error::InvalidImage(format!(
                "'{mime_type}' is not an image type"
            )));
        }
        Ok(Self { bytes, mime_type })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: construction rejects empty payloads
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the MIME type is one of [`ACCEPTED_UPLOAD_TYPES`]
    pub fn is_accepted_upload(&self) -> bool {
        ACCEPTED_UPLOAD_TYPES.contains(&self.mime_type.as_str())
    }

    /// Standard padded base64 for inline transport
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Provider API key. Formatting never reveals the secret.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The secret itself, for the request header only
    pub fn expose(&self) -> &str {
        self.0.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(***)")
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_blank() {
            f.write_str("<unset>")
        } else {
            f.write_str("***")
        }
    }
}

impl From<String> for Credential {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for Credential {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// One image to analyze and the credential to analyze it with
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    image: ImagePayload,
    credential: Option<Credential>,
}

impl AnalysisRequest {
    pub fn new(image: ImagePayload) -> Self {
        Self {
            image,
            credential: None,
        }
    }

    /// Convenience constructor from raw parts
    pub fn from_parts(
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        credential: impl Into<Credential>,
    ) -> crate::Result<Self> {
        Ok(Self::new(ImagePayload::new(bytes, mime_type)?).with_credential(credential))
    }

    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<Credential>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn image(&self) -> &ImagePayload {
        &self.image
    }

    /// The credential, if one is present and not blank
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref().filter(|c| !c.is_blank())
    }
}
