//! Backend acknowledgment types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of whoever owns a triggered alert; backends send ids as numbers or strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectId::Number(n) => write!(f, "{}", n),
            SubjectId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One alert the backend fired for the reported price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAlert {
    pub subject_id: SubjectId,
    pub level_pct: f64,
    pub gain_usd: f64,
}

/// Response to a price report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportAck {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub alerts_triggered: u32,
    #[serde(default)]
    pub alerts: Vec<TriggeredAlert>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_ack() {
        let ack: ReportAck = serde_json::from_str(
            r#"{
                "success": true,
                "message": "Precio procesado",
                "alerts_triggered": 2,
                "alerts": [
                    { "subject_id": 17, "level_pct": 5.0, "gain_usd": 120.5 },
                    { "subject_id": "u-42", "level_pct": 10.0, "gain_usd": 980.0 }
                ]
            }"#,
        )
        .unwrap();

        assert!(ack.success);
        assert_eq!(ack.alerts_triggered, 2);
        assert_eq!(ack.alerts[0].subject_id, SubjectId::Number(17));
        assert_eq!(ack.alerts[1].subject_id.to_string(), "u-42");
    }

    #[test]
    fn test_minimal_ack() {
        let ack: ReportAck = serde_json::from_str(r#"{ "success": true }"#).unwrap();
        assert!(ack.message.is_empty());
        assert_eq!(ack.alerts_triggered, 0);
        assert!(ack.alerts.is_empty());
    }

    #[test]
    fn test_ack_requires_success_flag() {
        assert!(serde_json::from_str::<ReportAck>(r#"{ "message": "ok" }"#).is_err());
    }
}
