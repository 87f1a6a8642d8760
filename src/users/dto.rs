use serde::Serialize;
use time::OffsetDateTime;

/// Normalized create payload, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: String,
    pub password: String,
}

/// Envelope every successful response is wrapped in.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message,
            data,
            count: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedUser {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub user_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_omits_count_unless_set() {
        let json = serde_json::to_value(ApiResponse::ok("done", 1)).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("count").is_none());

        let json = serde_json::to_value(ApiResponse::ok("done", [1, 2]).with_count(2)).unwrap();
        assert_eq!(json["count"], 2);
    }

    #[test]
    fn health_uses_camel_case() {
        let json = serde_json::to_value(HealthStatus {
            status: "healthy",
            timestamp: OffsetDateTime::UNIX_EPOCH,
            user_count: 3,
        })
        .unwrap();
        assert_eq!(json["userCount"], 3);
        assert_eq!(json["timestamp"], "1970-01-01T00:00:00Z");
    }
}
