use crate::config::ClassifierConfig;
use crate::types::{FeedEntry, Result, SieveError};
use async_trait::async_trait;
use backoff::backoff::{Backoff, Constant};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Rule block sent as the system instruction with every request. The model
/// must answer with a single pipe-delimited line.
const SYSTEM_INSTRUCTION: &str = r#"
你是一個嚴格的優惠分析員。你的任務是過濾香港的優惠貼文：

針對每一項貼文，請盡量填寫以下資訊：
shop=商店名
payment=支付方法/會員/身份(如長者)
min_spend=最低消費額
rate=折扣(百分比)
amt=折扣額(數字)
start_date=優惠開始日期 (格式 yyyy-MM-dd)
end_date=優惠完結日期 (格式 yyyy-MM-dd)
applicable_days_of_week=每周星期幾適用 (例如: 1,2,3)
applicable_days_of_month=每月適用日子 (例如: 2,20)

然後以下列原因分析是否過濾：
【必須接受的條件】
1. 該優惠必須涵蓋以下商店類型：超市、便利店、食品店、餅店、健康美容店。
2. 該優惠「必須」是「會員專屬優惠」或者是要求「特定支付方式/特定信用卡」的優惠。

【必須拒絕的條件】
1. 完全排除以下商店類型的優惠：餐廳、服裝店、家具店、珠寶店、小店、百貨公司、機票、電器等。
2. 完全排除「任何人」都可以享受的普通特價、減價宣傳、週末優惠、新品推廣等。即使是符合的商店，如果沒有門檻，也必須拒絕。

result=你的分析結果(1代表接受符合所有嚴格條件，0代表拒絕，2代表不肯定，-1代表有錯誤)
text=文字說明
如分析結果是接受，請以文字說明優惠內容，例如「每月2、20日以AEON信用卡簽帳可享5%優惠」
否則，請以文字說明拒絕原因，例如「餐廳」

輸出格式要求：你必須「只」輸出一行格式化的字串，各欄位以 "|" 分隔。不包含欄位不要輸出。不要輸出任何 Markdown 或說明文字。
範例輸出 1 (接受)：
shop="AEON"|payment="AEON信用卡"|rate=0.05|start_date="2026-03-21"|end_date="2026-03-28"|text="每月2、20日以AEON信用卡簽帳可享5%優惠"|result=1

範例輸出 2 (拒絕：純特價或不符商店)：
shop="譚仔雲南米線"|text="餐廳"|result=0
"#;

/// Initial call plus exactly one retry on a quota error.
const MAX_ATTEMPTS: u32 = 2;

/// Labels one feed entry with the model's verdict line.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, entry: &FeedEntry) -> Result<String>;
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    #[serde(rename = "systemInstruction")]
    system_instruction: RequestContent<'a>,
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Default, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

pub struct GeminiClassifier {
    client: Client,
    config: ClassifierConfig,
}

impl GeminiClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base, self.config.model
        )
    }

    /// One generateContent call, no retry policy.
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            system_instruction: RequestContent {
                parts: vec![RequestPart {
                    text: SYSTEM_INSTRUCTION,
                }],
            },
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let body: GenerateContentResponse = response.json().await?;
        let text: String = body
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(SieveError::Classifier(
                "Response contained no text".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(&self, entry: &FeedEntry) -> Result<String> {
        debug!("Requesting classification for '{}'", entry.title);

        let prompt = build_prompt(entry);
        let mut backoff = Constant::new(Duration::from_secs(self.config.retry_delay_seconds));
        let mut attempt = 0;

        loop {
            match self.generate(&prompt).await {
                Ok(text) => return Ok(single_line(&text)),
                Err(err) if err.is_quota() && attempt + 1 < MAX_ATTEMPTS => {
                    attempt += 1;
                    if let Some(delay) = backoff.next_backoff() {
                        warn!(
                            "Quota exceeded for '{}', retrying in {:?}: {}",
                            entry.title, delay, err
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn build_prompt(entry: &FeedEntry) -> String {
    format!(
        "請分析以下貼文：\n標題：{}\n內文片段：{}",
        entry.title, entry.summary
    )
}

/// The output contract is one physical line per entry.
fn single_line(text: &str) -> String {
    text.trim().lines().collect::<Vec<_>>().join(" ")
}

/// Decide whether a non-success response is quota-class, and therefore
/// worth the single retry.
fn classify_failure(status: StatusCode, body: &str) -> SieveError {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .map(|wrapper| wrapper.error)
        .unwrap_or_default();

    let message = if detail.message.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, detail.message)
    };

    if status == StatusCode::TOO_MANY_REQUESTS
        || detail.status == "RESOURCE_EXHAUSTED"
        || detail.message.to_lowercase().contains("quota")
    {
        SieveError::QuotaExceeded(message)
    } else {
        SieveError::Classifier(message)
    }
}
