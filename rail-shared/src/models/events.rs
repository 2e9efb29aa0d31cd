use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Events published on the in-process bus after a state change commits.
///
/// Passenger details are deliberately absent: the stream is readable by any
/// authenticated user.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RailEvent {
    TrainRegistered {
        event_id: Uuid,
        train_no: String,
        seats: u32,
        timestamp: DateTime<Utc>,
    },
    SeatBooked {
        event_id: Uuid,
        train_no: String,
        seat_number: i64,
        category: String,
        timestamp: DateTime<Utc>,
    },
    TrainRemoved {
        event_id: Uuid,
        train_no: String,
        timestamp: DateTime<Utc>,
    },
}

impl RailEvent {
    pub fn train_registered(train_no: &str, seats: u32) -> Self {
        Self::TrainRegistered {
            event_id: Uuid::new_v4(),
            train_no: train_no.to_string(),
            seats,
            timestamp: Utc::now(),
        }
    }

    pub fn seat_booked(train_no: &str, seat_number: i64, category: &str) -> Self {
        Self::SeatBooked {
            event_id: Uuid::new_v4(),
            train_no: train_no.to_string(),
            seat_number,
            category: category.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn train_removed(train_no: &str) -> Self {
        Self::TrainRemoved {
            event_id: Uuid::new_v4(),
            train_no: train_no.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn train_no(&self) -> &str {
        match self {
            Self::TrainRegistered { train_no, .. }
            | Self::SeatBooked { train_no, .. }
            | Self::TrainRemoved { train_no, .. } => train_no,
        }
    }

    /// SSE event name for this payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TrainRegistered { .. } => "train_registered",
            Self::SeatBooked { .. } => "seat_booked",
            Self::TrainRemoved { .. } => "train_removed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_booked_wire_format() {
        let event = RailEvent::seat_booked("12951", 4, "window");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "seat_booked");
        assert_eq!(json["train_no"], "12951");
        assert_eq!(json["seat_number"], 4);
        assert_eq!(json["category"], "window");
        assert!(json.get("passenger_name").is_none());
        assert_eq!(event.kind(), "seat_booked");
        assert_eq!(event.train_no(), "12951");
    }
}
