//! Dictionary lookup client
//!
//! Thin wrapper over the remote dictionary API. The raw response is an
//! array of entries; only the first is kept, reshaped into [`Definition`]
//! with each part-of-speech group truncated to at most two definitions.

use serde::{Deserialize, Serialize};

use crate::config::DictionaryConfig;
use crate::error::LookupError;

/// A formatted definition, the shape stored in the word list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub word: String,
    /// Empty string when the API has no phonetic spelling
    #[serde(default)]
    pub phonetic: String,
    pub meanings: Vec<MeaningGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeaningGroup {
    #[serde(rename = "partOfSpeech")]
    pub part_of_speech: String,
    pub definitions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiEntry {
    word: String,
    phonetic: Option<String>,
    #[serde(default)]
    meanings: Vec<ApiMeaning>,
}

#[derive(Debug, Deserialize)]
struct ApiMeaning {
    #[serde(rename = "partOfSpeech")]
    part_of_speech: String,
    #[serde(default)]
    definitions: Vec<ApiDefinition>,
}

#[derive(Debug, Deserialize)]
struct ApiDefinition {
    definition: String,
}

/// Client for the word-definition service
pub struct DictionaryClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: std::time::Duration,
}

impl DictionaryClient {
    pub fn new(config: &DictionaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            timeout: std::time::Duration::from_secs(config.timeout_secs),
        }
    }

    /// Look up a word. 404 and empty responses are `NotFound`; everything
    /// else that goes wrong is `Network`.
    pub async fn lookup(&self, word: &str) -> Result<Definition, LookupError> {
        let url = format!("{}/{}", self.endpoint, urlencoding::encode(word));

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(word.to_string()));
        }
        if !response.status().is_success() {
            return Err(LookupError::Network(format!(
                "dictionary responded with {}",
                response.status()
            )));
        }

        let entries: Vec<ApiEntry> = response
            .json()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let first = entries
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::NotFound(word.to_string()))?;

        tracing::debug!(word = %first.word, "Dictionary lookup succeeded");
        Ok(format_entry(first))
    }
}

fn format_entry(entry: ApiEntry) -> Definition {
    Definition {
        word: entry.word,
        phonetic: entry.phonetic.unwrap_or_default(),
        meanings: entry
            .meanings
            .into_iter()
            .map(|meaning| MeaningGroup {
                part_of_speech: meaning.part_of_speech,
                definitions: meaning
                    .definitions
                    .into_iter()
                    .take(2)
                    .map(|d| d.definition)
                    .collect(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn client(endpoint: String) -> DictionaryClient {
        DictionaryClient::new(&DictionaryConfig {
            endpoint,
            timeout_secs: 5,
        })
    }

    /// Serve exactly one HTTP response, then close.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_lookup_formats_and_truncates() {
        let endpoint = serve_once(
            "200 OK",
            r#"[{"word":"serendipity","meanings":[{"partOfSpeech":"noun","definitions":[{"definition":"first"},{"definition":"second"},{"definition":"third"}]}]}]"#,
        )
        .await;

        let definition = client(endpoint).lookup("serendipity").await.unwrap();
        assert_eq!(definition.word, "serendipity");
        assert_eq!(definition.phonetic, "");
        assert_eq!(definition.meanings.len(), 1);
        assert_eq!(definition.meanings[0].part_of_speech, "noun");
        assert_eq!(definition.meanings[0].definitions, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_unknown_word_is_not_found() {
        let endpoint = serve_once("404 Not Found", r#"{"title":"No Definitions Found"}"#).await;
        let err = client(endpoint).lookup("zzzzqqq").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(w) if w == "zzzzqqq"));
    }

    #[tokio::test]
    async fn test_server_error_is_network() {
        let endpoint = serve_once("500 Internal Server Error", "").await;
        let err = client(endpoint).lookup("word").await.unwrap_err();
        assert!(matches!(err, LookupError::Network(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network() {
        let err = client("http://127.0.0.1:9".to_string())
            .lookup("word")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Network(_)));
    }
}
