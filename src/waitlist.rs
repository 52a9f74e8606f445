//! Salary predictor and waitlist sign-up
//!
//! A successful prediction also registers the email (if any) on the waitlist.
//! A failed waitlist write never hides the prediction.

use crate::session::{DocumentPath, FieldValue, Fields, SessionStore};
use crate::suggest::SuggestionClient;
use tracing::{info, warn};

pub const MISSING_INPUT_MESSAGE: &str = "Enter values to generate an output";
pub const PREDICTION_FAILED_MESSAGE: &str = "Error occurred during prediction";
pub const WAITLIST_JOINED_MESSAGE: &str =
    "You have been added to the waitlist. We're excited to have you onboard";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionForm {
    pub age: String,
    pub weight: String,
    pub email: String,
    prediction: Option<String>,
    error: Option<String>,
    waitlist_message: Option<String>,
}

impl PredictionForm {
    pub fn prediction(&self) -> Option<&str> {
        self.prediction.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Set once the email has been written to the waitlist
    pub fn waitlist_message(&self) -> Option<&str> {
        self.waitlist_message.as_deref()
    }

    /// Both inputs must be non-empty; whitespace counts as input
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.age.is_empty() || self.weight.is_empty() {
            return Err(MISSING_INPUT_MESSAGE);
        }
        Ok(())
    }

    /// Validate, predict, then register the email if the prediction worked.
    ///
    /// Returns the formatted prediction when one was produced.
    pub async fn submit(
        &mut self,
        client: &SuggestionClient,
        store: &SessionStore,
    ) -> Option<String> {
        if let Err(message) = self.validate() {
            self.error = Some(message.to_string());
            self.prediction = None;
            return None;
        }

        match client.predict_salary(&self.age, &self.weight).await {
            Ok(salary) => {
                self.prediction = Some(format_gbp(salary));
                self.error = None;
                self.register(store).await;
            }
            Err(err) => {
                warn!(error = %err, "prediction failed");
                self.prediction = None;
                self.error = Some(PREDICTION_FAILED_MESSAGE.to_string());
            }
        }
        self.prediction.clone()
    }

    /// Explicit waitlist sign-up; the email field is cleared afterwards
    pub async fn join(&mut self, store: &SessionStore) -> bool {
        let joined = self.register(store).await;
        self.email.clear();
        joined
    }

    async fn register(&mut self, store: &SessionStore) -> bool {
        let joined = join_waitlist(store, &self.email).await;
        if joined {
            self.waitlist_message = Some(WAITLIST_JOINED_MESSAGE.to_string());
        }
        joined
    }

    /// Clear everything except the email
    pub fn reset(&mut self) {
        self.age.clear();
        self.weight.clear();
        self.prediction = None;
        self.error = None;
    }
}

/// Write `waitlist/{email}`. Failures are logged; callers are not told.
pub async fn join_waitlist(store: &SessionStore, email: &str) -> bool {
    if email.is_empty() {
        return false;
    }
    let path = match DocumentPath::waitlist(email) {
        Ok(path) => path,
        Err(err) => {
            warn!(error = %err, "email can't be used as a waitlist id");
            return false;
        }
    };
    let mut fields = Fields::new();
    fields.insert("email".to_string(), FieldValue::Text(email.to_string()));
    match store.set_document(&path, fields).await {
        Ok(()) => {
            info!(%path, "added to waitlist");
            true
        }
        Err(err) => {
            warn!(%path, error = %err, "waitlist write failed");
            false
        }
    }
}

/// Round to whole pounds, then format like en-GB currency: `45000.4` → `£45,000.00`
pub fn format_gbp(amount: f64) -> String {
    let pounds = amount.abs().round() as u64;

    let digits = pounds.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && pounds > 0 { "-" } else { "" };
    format!("{}£{}.00", sign, grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_format_gbp() {
        assert_eq!(format_gbp(45000.0), "£45,000.00");
        assert_eq!(format_gbp(45000.4), "£45,000.00");
        assert_eq!(format_gbp(999.5), "£1,000.00");
        assert_eq!(format_gbp(1234567.2), "£1,234,567.00");
        assert_eq!(format_gbp(0.3), "£0.00");
        assert_eq!(format_gbp(-12.6), "-£13.00");
    }

    #[test]
    fn test_validate_requires_both_inputs() {
        let mut form = PredictionForm::default();
        assert_eq!(form.validate(), Err(MISSING_INPUT_MESSAGE));
        form.age = "30".to_string();
        assert!(form.validate().is_err());
        form.weight = " ".to_string();
        assert!(form.validate().is_ok());
    }

    #[tokio::test]
    async fn test_submit_formats_and_joins_waitlist() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(body_json(json!({ "age": "30", "weight": "70" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "predicted_salary": 45000.4 })),
            )
            .expect(1)
            .mount(&server)
            .await;
        let client = SuggestionClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let store = SessionStore::in_memory();

        let mut form = PredictionForm {
            age: "30".to_string(),
            weight: "70".to_string(),
            email: "a@b.co".to_string(),
            ..Default::default()
        };
        assert_eq!(form.submit(&client, &store).await.as_deref(), Some("£45,000.00"));

        let doc = store
            .load_document(&DocumentPath::waitlist("a@b.co").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.fields.get("email"), Some(&FieldValue::Text("a@b.co".into())));
        assert_eq!(form.waitlist_message(), Some(WAITLIST_JOINED_MESSAGE));
        assert_eq!(form.email, "a@b.co");
    }

    #[tokio::test]
    async fn test_explicit_join_clears_email() {
        let store = SessionStore::in_memory();
        let mut form = PredictionForm {
            email: "g@h.co".to_string(),
            ..Default::default()
        };
        assert!(form.join(&store).await);
        assert!(form.email.is_empty());
        assert_eq!(form.waitlist_message(), Some(WAITLIST_JOINED_MESSAGE));

        assert!(!form.join(&store).await);
    }

    #[tokio::test]
    async fn test_submit_without_inputs_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let client = SuggestionClient::new(&server.uri(), Duration::from_secs(5)).unwrap();

        let mut form = PredictionForm::default();
        assert!(form.submit(&client, &SessionStore::in_memory()).await.is_none());
        assert_eq!(form.error(), Some(MISSING_INPUT_MESSAGE));
    }

    #[tokio::test]
    async fn test_prediction_failure_sets_error_and_skips_waitlist() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let client = SuggestionClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let store = SessionStore::in_memory();

        let mut form = PredictionForm {
            age: "30".to_string(),
            weight: "70".to_string(),
            email: "c@d.co".to_string(),
            ..Default::default()
        };
        assert!(form.submit(&client, &store).await.is_none());
        assert_eq!(form.error(), Some(PREDICTION_FAILED_MESSAGE));
        assert!(store
            .load_document(&DocumentPath::waitlist("c@d.co").unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_email_is_not_written() {
        assert!(!join_waitlist(&SessionStore::in_memory(), "").await);
    }

    #[test]
    fn test_reset_keeps_email() {
        let mut form = PredictionForm {
            age: "1".to_string(),
            weight: "2".to_string(),
            email: "e@f.co".to_string(),
            prediction: Some("£1.00".to_string()),
            ..Default::default()
        };
        form.reset();
        assert!(form.age.is_empty() && form.weight.is_empty());
        assert!(form.prediction().is_none());
        assert_eq!(form.email, "e@f.co");
    }
}
