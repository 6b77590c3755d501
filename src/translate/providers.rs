//! Classical MT provider implementations.
//!
//! Each provider reads its API key from an environment variable at call
//! time and returns [`TranslateError::MissingKey`] when unset, so an
//! unconfigured provider drops out of the fallback chain silently.
//! Language codes come from the per-provider tables in [`crate::lang`].
//!
//! All requests share one `reqwest::Client` pre-configured with the MT
//! timeout.

use std::time::Duration;

use async_trait::async_trait;
use md5::{Digest, Md5};
use sha2::Sha256;

use crate::lang::{source_row, target_row};

use super::provider::{TranslateError, Translator};

/// Build the shared HTTP client with the MT timeout.
///
/// A default (no-timeout) client is the last-resort fallback if the
/// builder fails, which does not happen in practice.
pub fn mt_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn env_key(var: &'static str) -> Result<String, TranslateError> {
    match std::env::var(var) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(TranslateError::MissingKey(var)),
    }
}

/// Hex digest helpers for the signing providers.
fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Monotonic-ish salt for request signing.
fn signing_salt() -> String {
    format!("{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0))
}

// ---------------------------------------------------------------------------
// DeepL
// ---------------------------------------------------------------------------

/// DeepL REST API. `DEEPL_AUTH_KEY`.
pub struct DeepL {
    client: reqwest::Client,
    source: Option<String>,
    target: String,
}

impl DeepL {
    pub fn new(client: reqwest::Client, source_lang: &str, target_lang: &str) -> Self {
        Self {
            client,
            source: source_row(source_lang).deepl.map(str::to_string),
            target: target_row(target_lang)
                .deepl
                .unwrap_or("EN")
                .to_string(),
        }
    }
}

#[async_trait]
impl Translator for DeepL {
    fn name(&self) -> &'static str {
        "DeepL"
    }

    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let key = env_key("DEEPL_AUTH_KEY")?;

        let mut payload = serde_json::json!({
            "text": [text],
            "target_lang": self.target,
        });
        if let Some(src) = &self.source {
            payload["source_lang"] = serde_json::json!(src);
        }

        let resp = self
            .client
            .post("https://api-free.deepl.com/v2/translate")
            .header("Authorization", format!("DeepL-Auth-Key {key}"))
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| TranslateError::Api(e.to_string()))?;

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        json["translations"][0]["text"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(TranslateError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// Google
// ---------------------------------------------------------------------------

/// Google Cloud Translation API v2. `GOOGLE_TRANSLATE_API_KEY`.
pub struct Google {
    client: reqwest::Client,
    source: Option<String>,
    target: String,
}

impl Google {
    pub fn new(client: reqwest::Client, source_lang: &str, target_lang: &str) -> Self {
        Self {
            client,
            source: source_row(source_lang).google.map(str::to_string),
            target: target_row(target_lang)
                .google
                .unwrap_or("en")
                .to_string(),
        }
    }
}

#[async_trait]
impl Translator for Google {
    fn name(&self) -> &'static str {
        "Google"
    }

    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let key = env_key("GOOGLE_TRANSLATE_API_KEY")?;

        let mut params = vec![
            ("q", text.to_string()),
            ("target", self.target.clone()),
            ("key", key),
            ("format", "text".to_string()),
        ];
        if let Some(src) = &self.source {
            params.push(("source", src.clone()));
        }

        let resp = self
            .client
            .post("https://translation.googleapis.com/language/translate/v2")
            .query(&params)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| TranslateError::Api(e.to_string()))?;

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        json["data"]["translations"][0]["translatedText"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(TranslateError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// Baidu
// ---------------------------------------------------------------------------

/// Baidu 百度翻译, MD5-signed requests. `BAIDU_APP_ID` + `BAIDU_APP_SECRET`.
pub struct Baidu {
    client: reqwest::Client,
    source: String,
    target: String,
}

impl Baidu {
    pub fn new(client: reqwest::Client, source_lang: &str, target_lang: &str) -> Self {
        Self {
            client,
            source: source_row(source_lang).baidu.to_string(),
            target: target_row(target_lang).baidu.to_string(),
        }
    }
}

#[async_trait]
impl Translator for Baidu {
    fn name(&self) -> &'static str {
        "Baidu"
    }

    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let app_id = env_key("BAIDU_APP_ID")?;
        let secret = env_key("BAIDU_APP_SECRET")?;

        let salt = signing_salt();
        let sign = md5_hex(&format!("{app_id}{text}{salt}{secret}"));

        let resp = self
            .client
            .get("https://api.fanyi.baidu.com/api/trans/vip/translate")
            .query(&[
                ("q", text),
                ("from", self.source.as_str()),
                ("to", self.target.as_str()),
                ("appid", app_id.as_str()),
                ("salt", salt.as_str()),
                ("sign", sign.as_str()),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| TranslateError::Api(e.to_string()))?;

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        if let Some(code) = json.get("error_code").and_then(|v| v.as_str()) {
            let msg = json["error_msg"].as_str().unwrap_or(code);
            return Err(TranslateError::Api(msg.to_string()));
        }
        json["trans_result"][0]["dst"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(TranslateError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// Youdao
// ---------------------------------------------------------------------------

/// Youdao 有道, SHA-256 v3 signing. `YOUDAO_APP_KEY` + `YOUDAO_APP_SECRET`.
pub struct Youdao {
    client: reqwest::Client,
    source: String,
    target: String,
}

impl Youdao {
    pub fn new(client: reqwest::Client, source_lang: &str, target_lang: &str) -> Self {
        Self {
            client,
            source: source_row(source_lang).youdao.to_string(),
            target: target_row(target_lang).youdao.to_string(),
        }
    }

    /// Youdao's `input` truncation: texts over 20 chars sign as
    /// `first10 + len + last10`.
    fn sign_input(text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= 20 {
            text.to_string()
        } else {
            let head: String = chars[..10].iter().collect();
            let tail: String = chars[chars.len() - 10..].iter().collect();
            format!("{head}{}{tail}", chars.len())
        }
    }
}

#[async_trait]
impl Translator for Youdao {
    fn name(&self) -> &'static str {
        "Youdao"
    }

    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let app_key = env_key("YOUDAO_APP_KEY")?;
        let secret = env_key("YOUDAO_APP_SECRET")?;

        let salt = signing_salt();
        let curtime = format!("{}", chrono::Utc::now().timestamp());
        let sign = sha256_hex(&format!(
            "{app_key}{}{salt}{curtime}{secret}",
            Self::sign_input(text)
        ));

        let resp = self
            .client
            .post("https://openapi.youdao.com/api")
            .form(&[
                ("q", text),
                ("from", self.source.as_str()),
                ("to", self.target.as_str()),
                ("appKey", app_key.as_str()),
                ("salt", salt.as_str()),
                ("sign", sign.as_str()),
                ("signType", "v3"),
                ("curtime", curtime.as_str()),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| TranslateError::Api(e.to_string()))?;

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        if json["errorCode"].as_str() != Some("0") {
            return Err(TranslateError::Api(format!(
                "errorCode {}",
                json["errorCode"].as_str().unwrap_or("?")
            )));
        }
        json["translation"][0]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(TranslateError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// Yandex
// ---------------------------------------------------------------------------

/// Yandex Cloud Translate v2. `YANDEX_API_KEY`.
pub struct Yandex {
    client: reqwest::Client,
    source: Option<String>,
    target: String,
}

impl Yandex {
    pub fn new(client: reqwest::Client, source_lang: &str, target_lang: &str) -> Self {
        Self {
            client,
            source: (source_lang != "auto").then(|| source_lang.to_string()),
            target: target_lang.to_string(),
        }
    }
}

#[async_trait]
impl Translator for Yandex {
    fn name(&self) -> &'static str {
        "Yandex"
    }

    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let key = env_key("YANDEX_API_KEY")?;

        let mut payload = serde_json::json!({
            "targetLanguageCode": self.target,
            "texts": [text],
            "format": "PLAIN_TEXT",
        });
        if let Some(src) = &self.source {
            payload["sourceLanguageCode"] = serde_json::json!(src);
        }

        let resp = self
            .client
            .post("https://translate.api.cloud.yandex.net/translate/v2/translate")
            .header("Authorization", format!("Api-Key {key}"))
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| TranslateError::Api(e.to_string()))?;

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        json["translations"][0]["text"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(TranslateError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// LibreTranslate
// ---------------------------------------------------------------------------

/// Self-hosted or public LibreTranslate. `LIBRETRANSLATE_URL` selects the
/// instance (the provider is unconfigured without it); an optional
/// `LIBRETRANSLATE_API_KEY` is attached when present.
pub struct LibreTranslate {
    client: reqwest::Client,
    source: String,
    target: String,
}

impl LibreTranslate {
    pub fn new(client: reqwest::Client, source_lang: &str, target_lang: &str) -> Self {
        Self {
            client,
            source: source_lang.to_string(),
            target: target_lang.to_string(),
        }
    }
}

#[async_trait]
impl Translator for LibreTranslate {
    fn name(&self) -> &'static str {
        "LibreTranslate"
    }

    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let base = env_key("LIBRETRANSLATE_URL")?;

        let mut payload = serde_json::json!({
            "q": text,
            "source": self.source,
            "target": self.target,
            "format": "text",
        });
        if let Ok(key) = std::env::var("LIBRETRANSLATE_API_KEY") {
            if !key.is_empty() {
                payload["api_key"] = serde_json::json!(key);
            }
        }

        let resp = self
            .client
            .post(format!("{}/translate", base.trim_end_matches('/')))
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| TranslateError::Api(e.to_string()))?;

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        json["translatedText"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(TranslateError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// Caiyun
// ---------------------------------------------------------------------------

/// Caiyun 彩云小译. `CAIYUN_TOKEN`.
pub struct Caiyun {
    client: reqwest::Client,
    trans_type: String,
}

impl Caiyun {
    pub fn new(client: reqwest::Client, source_lang: &str, target_lang: &str) -> Self {
        Self {
            client,
            trans_type: format!("{source_lang}2{target_lang}"),
        }
    }
}

#[async_trait]
impl Translator for Caiyun {
    fn name(&self) -> &'static str {
        "Caiyun"
    }

    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let token = env_key("CAIYUN_TOKEN")?;

        let resp = self
            .client
            .post("https://api.interpreter.caiyunai.com/v1/translator")
            .header("x-authorization", format!("token {token}"))
            .json(&serde_json::json!({
                "source": [text],
                "trans_type": self.trans_type,
                "request_id": "live-translate",
                "detect": true,
            }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| TranslateError::Api(e.to_string()))?;

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        json["target"][0]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(TranslateError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// Niutrans
// ---------------------------------------------------------------------------

/// Niutrans 小牛翻译. `NIUTRANS_API_KEY`.
pub struct Niutrans {
    client: reqwest::Client,
    source: String,
    target: String,
}

impl Niutrans {
    pub fn new(client: reqwest::Client, source_lang: &str, target_lang: &str) -> Self {
        Self {
            client,
            source: source_lang.to_string(),
            target: target_lang.to_string(),
        }
    }
}

#[async_trait]
impl Translator for Niutrans {
    fn name(&self) -> &'static str {
        "Niutrans"
    }

    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let key = env_key("NIUTRANS_API_KEY")?;

        let resp = self
            .client
            .post("https://api.niutrans.com/NiuTransServer/translation")
            .json(&serde_json::json!({
                "from": self.source,
                "to": self.target,
                "apikey": key,
                "src_text": text,
            }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| TranslateError::Api(e.to_string()))?;

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        if let Some(msg) = json.get("error_msg").and_then(|v| v.as_str()) {
            return Err(TranslateError::Api(msg.to_string()));
        }
        json["tgt_text"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(TranslateError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// Chain construction
// ---------------------------------------------------------------------------

use std::sync::Arc;

/// MT fallback chain used when the dispatcher is backing an LLM:
/// DeepL → Google → Yandex → LibreTranslate → Caiyun → Niutrans.
pub fn llm_fallback_chain(
    client: &reqwest::Client,
    source_lang: &str,
    target_lang: &str,
) -> Vec<Arc<dyn Translator>> {
    vec![
        Arc::new(DeepL::new(client.clone(), source_lang, target_lang)),
        Arc::new(Google::new(client.clone(), source_lang, target_lang)),
        Arc::new(Yandex::new(client.clone(), source_lang, target_lang)),
        Arc::new(LibreTranslate::new(client.clone(), source_lang, target_lang)),
        Arc::new(Caiyun::new(client.clone(), source_lang, target_lang)),
        Arc::new(Niutrans::new(client.clone(), source_lang, target_lang)),
    ]
}

/// Full MT chain for small-model mode:
/// DeepL → Google → Baidu → Youdao → Yandex → LibreTranslate → Caiyun → Niutrans.
pub fn small_model_chain(
    client: &reqwest::Client,
    source_lang: &str,
    target_lang: &str,
) -> Vec<Arc<dyn Translator>> {
    vec![
        Arc::new(DeepL::new(client.clone(), source_lang, target_lang)),
        Arc::new(Google::new(client.clone(), source_lang, target_lang)),
        Arc::new(Baidu::new(client.clone(), source_lang, target_lang)),
        Arc::new(Youdao::new(client.clone(), source_lang, target_lang)),
        Arc::new(Yandex::new(client.clone(), source_lang, target_lang)),
        Arc::new(LibreTranslate::new(client.clone(), source_lang, target_lang)),
        Arc::new(Caiyun::new(client.clone(), source_lang, target_lang)),
        Arc::new(Niutrans::new(client.clone(), source_lang, target_lang)),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_orders_match_design() {
        let client = mt_client(10);
        let chain = llm_fallback_chain(&client, "zh", "en");
        let names: Vec<&str> = chain.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            ["DeepL", "Google", "Yandex", "LibreTranslate", "Caiyun", "Niutrans"]
        );

        let chain = small_model_chain(&client, "zh", "en");
        let names: Vec<&str> = chain.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            ["DeepL", "Google", "Baidu", "Youdao", "Yandex", "LibreTranslate", "Caiyun",
             "Niutrans"]
        );
    }

    #[tokio::test]
    async fn unset_key_yields_missing_key() {
        // DEEPL_AUTH_KEY is not set in the test environment.
        std::env::remove_var("DEEPL_AUTH_KEY");
        let provider = DeepL::new(mt_client(10), "zh", "en");
        assert!(matches!(
            provider.translate("你好").await.unwrap_err(),
            TranslateError::MissingKey("DEEPL_AUTH_KEY")
        ));
    }

    #[test]
    fn youdao_sign_input_truncates_long_text() {
        let short = "short text";
        assert_eq!(Youdao::sign_input(short), short);

        let long: String = "一二三四五六七八九十甲乙丙丁戊己庚辛壬癸多余".into();
        let signed = Youdao::sign_input(&long);
        assert!(signed.starts_with("一二三四五六七八九十"));
        assert!(signed.contains("22"));
        assert!(signed.ends_with("丙丁戊己庚辛壬癸多余"));
    }

    #[test]
    fn md5_and_sha256_are_hex() {
        let m = md5_hex("abc");
        assert_eq!(m.len(), 32);
        assert_eq!(m, "900150983cd24fb0d6963f7d28e17f72");

        let s = sha256_hex("abc");
        assert_eq!(s.len(), 64);
        assert!(s.starts_with("ba7816bf"));
    }
}
