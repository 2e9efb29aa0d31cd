use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Every train is provisioned with this many seats, numbered from 1.
pub const SEATS_PER_TRAIN: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatCategory {
    Window,
    Aisle,
    Middle,
}

impl SeatCategory {
    pub const ALL: [SeatCategory; 3] = [SeatCategory::Window, SeatCategory::Aisle, SeatCategory::Middle];

    /// Category of a seat, a pure function of the seat number's last digit.
    pub fn of(seat_number: u32) -> Self {
        match seat_number % 10 {
            0 | 4 | 5 | 9 => SeatCategory::Window,
            2 | 3 | 6 | 7 => SeatCategory::Aisle,
            _ => SeatCategory::Middle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatCategory::Window => "window",
            SeatCategory::Aisle => "aisle",
            SeatCategory::Middle => "middle",
        }
    }
}

impl fmt::Display for SeatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "window" => Ok(SeatCategory::Window),
            "aisle" => Ok(SeatCategory::Aisle),
            "middle" => Ok(SeatCategory::Middle),
            other => Err(CoreError::ValidationError(format!("Unknown seat category: {}", other))),
        }
    }
}

/// The full seat layout of a freshly registered train.
pub fn seat_plan() -> impl Iterator<Item = (u32, SeatCategory)> {
    (1..=SEATS_PER_TRAIN).map(|n| (n, SeatCategory::of(n)))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Seat {
    pub seat_number: i64,
    pub category: SeatCategory,
    pub booked: bool,
    pub passenger_name: String,
    pub passenger_age: String,
    pub passenger_gender: String,
    pub booked_at: Option<DateTime<Utc>>,
}

/// Passenger details written onto a seat by a booking.
#[derive(Debug, Clone)]
pub struct Passenger {
    pub name: rail_shared::Masked<String>,
    pub age: String,
    pub gender: String,
}

impl Passenger {
    pub fn new(name: impl Into<String>, age: impl Into<String>, gender: impl Into<String>) -> Self {
        Self {
            name: rail_shared::Masked(name.into()),
            age: age.into(),
            gender: gender.into(),
        }
    }

    /// Trims every field; a passenger must at least have a name.
    pub fn normalized(self) -> Result<Self, CoreError> {
        let name = self.name.expose().trim().to_string();
        if name.is_empty() {
            return Err(CoreError::ValidationError("Passenger name is required".to_string()));
        }

        Ok(Self {
            name: rail_shared::Masked(name),
            age: self.age.trim().to_string(),
            gender: self.gender.trim().to_string(),
        })
    }
}

/// Outcome of a successful booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeatAllocation {
    pub seat_number: i64,
    pub category: SeatCategory,
}

/// Free seats per category for one train.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub window: u32,
    pub aisle: u32,
    pub middle: u32,
}

impl Availability {
    pub fn set(&mut self, category: SeatCategory, free: u32) {
        match category {
            SeatCategory::Window => self.window = free,
            SeatCategory::Aisle => self.aisle = free,
            SeatCategory::Middle => self.middle = free,
        }
    }

    pub fn total(&self) -> u32 {
        self.window + self.aisle + self.middle
    }
}
