//! Scripted fakes for external collaborators

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::ai::http_client::{Transport, TransportResponse};
use crate::ai::images::ImageGenerator;
use crate::billing::{StoreBridge, StoreTransaction};

type Scripted = (Duration, Result<TransportResponse, String>);

/// Transport that replays queued responses and records what was sent
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<Scripted>>,
    downloads: Mutex<VecDeque<Result<Vec<u8>, String>>>,
    requests: Mutex<Vec<(String, Value)>>,
    download_urls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_delayed(&self, delay: Duration, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back((
            delay,
            Ok(TransportResponse {
                status,
                body: body.to_string(),
            }),
        ));
    }

    /// 200 response whose `.text` is `text`
    pub fn push_text_payload(&self, text: &str) {
        let body = serde_json::json!({ "text": text }).to_string();
        self.push_delayed(Duration::ZERO, 200, &body);
    }

    /// 200 response whose `.text` is `value` encoded as JSON
    pub fn push_structured(&self, value: &Value) {
        self.push_text_payload(&value.to_string());
    }

    pub fn push_json(&self, status: u16, body: &Value) {
        self.push_delayed(Duration::ZERO, status, &body.to_string());
    }

    pub fn push_network_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back((Duration::ZERO, Err(message.to_string())));
    }

    pub fn push_download(&self, result: Result<Vec<u8>, String>) {
        self.downloads.lock().unwrap().push_back(result);
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn download_urls(&self) -> Vec<String> {
        self.download_urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, String> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        let next = self.responses.lock().unwrap().pop_front();
        let (delay, result) = next.unwrap_or((Duration::ZERO, Err("no scripted response".into())));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, String> {
        self.download_urls.lock().unwrap().push(url.to_string());
        let next = self.downloads.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err("no scripted download".into()))
    }
}

/// In-memory platform store
#[derive(Default)]
pub struct FakeStoreBridge {
    transactions: tokio::sync::Mutex<Vec<StoreTransaction>>,
    finished: tokio::sync::Mutex<Vec<String>>,
}

impl FakeStoreBridge {
    pub fn with_transactions(transactions: Vec<StoreTransaction>) -> Self {
        Self {
            transactions: tokio::sync::Mutex::new(transactions),
            finished: Default::default(),
        }
    }

    pub async fn finished(&self) -> Vec<String> {
        self.finished.lock().await.clone()
    }
}

#[async_trait]
impl StoreBridge for FakeStoreBridge {
    async fn connect(&self) -> Result<(), String> {
        Ok(())
    }

    async fn request_purchase(&self, product_id: &str) -> Result<StoreTransaction, String> {
        let now = Utc::now();
        let transaction = StoreTransaction {
            transaction_id: format!("txn-{}", uuid::Uuid::new_v4()),
            product_id: product_id.to_string(),
            purchase_date: now,
            expiry_date: Some(now + ChronoDuration::days(30)),
            receipt: Some("fake-receipt".into()),
            revoked: false,
        };
        self.transactions.lock().await.push(transaction.clone());
        Ok(transaction)
    }

    async fn current_transactions(&self) -> Result<Vec<StoreTransaction>, String> {
        Ok(self.transactions.lock().await.clone())
    }

    async fn finish_transaction(&self, transaction_id: &str) -> Result<(), String> {
        self.finished.lock().await.push(transaction_id.to_string());
        Ok(())
    }
}

/// Image generator with a fixed outcome
#[derive(Default)]
pub struct StubImageGenerator {
    result: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl StubImageGenerator {
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn returning(path: &str) -> Self {
        Self {
            result: Some(path.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for StubImageGenerator {
    async fn generate_and_save(&self, prompt: &str) -> Option<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.result.clone()
    }
}

/// Model output for one schema-valid recipe
pub fn sample_recipe_json(name: &str, calories: f64, health_tips: &str) -> Value {
    serde_json::json!({
        "name": name,
        "originalName": "Lasanha",
        "description": "Versão leve com abobrinha no lugar da massa",
        "prepTime": "40 min",
        "difficulty": "Médio",
        "category": "Almoço",
        "macros": { "calories": calories, "protein": 32, "carbs": 18, "fats": 14 },
        "ingredients": [
            { "name": "Abobrinha", "quantity": "2 unidades", "icon": "🥒" },
            { "name": "Carne moída magra", "quantity": "300g", "icon": "🥩" }
        ],
        "instructions": ["Fatie a abobrinha", "Monte as camadas", "Asse por 25 min"],
        "substitutions": [
            { "original": "Massa", "replacement": "Abobrinha", "reason": "Menos carboidratos" }
        ],
        "healthTips": health_tips,
        "tags": ["low carb"]
    })
}
