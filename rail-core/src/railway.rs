use std::sync::Arc;
use tracing::{debug, info};

use crate::locks::TrainLocks;
use crate::repository::{SeatRepository, TrainRepository};
use crate::seat::{Availability, Passenger, Seat, SeatAllocation, SeatCategory};
use crate::train::{normalize_train_no, NewTrain, Train};
use crate::{CoreError, CoreResult};

/// Train registry, seat provisioning and booking.
///
/// Every mutation of a train (register, book, remove) holds that train's
/// lock, so a removal cannot interleave with an in-flight booking. Bookings
/// for numbers that were never registered are turned away before locking.
#[derive(Clone)]
pub struct RailwayService {
    trains: Arc<dyn TrainRepository>,
    seats: Arc<dyn SeatRepository>,
    locks: Arc<TrainLocks>,
}

impl RailwayService {
    pub fn new(trains: Arc<dyn TrainRepository>, seats: Arc<dyn SeatRepository>) -> Self {
        Self {
            trains,
            seats,
            locks: Arc::new(TrainLocks::new()),
        }
    }

    /// Registers a train together with its full seat set.
    pub async fn register(&self, train: NewTrain) -> CoreResult<Train> {
        let train = train.normalized()?;
        let _guard = self.locks.acquire(&train.number).await;

        let created = self.trains.register(&train).await?;
        info!("Registered train {} ({})", created.number, created.name);
        Ok(created)
    }

    pub async fn find(&self, number: &str) -> CoreResult<Train> {
        let number = normalize_train_no(number)?;
        self.trains
            .find(&number)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Train {}", number)))
    }

    /// Looks a train up by number. A supplied name must match exactly.
    pub async fn search(&self, number: &str, name: Option<&str>) -> CoreResult<Train> {
        let train = self.find(number).await?;
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) if name != train.name => {
                Err(CoreError::NotFound(format!("Train {} named {}", train.number, name)))
            }
            _ => Ok(train),
        }
    }

    pub async fn list(&self) -> CoreResult<Vec<Train>> {
        self.trains.list().await
    }

    /// Deletes the train and all of its seats.
    pub async fn remove(&self, number: &str) -> CoreResult<()> {
        let number = normalize_train_no(number)?;
        let _guard = self.locks.acquire(&number).await;

        if !self.trains.remove(&number).await? {
            return Err(CoreError::NotFound(format!("Train {}", number)));
        }
        info!("Removed train {} and its seats", number);
        Ok(())
    }

    pub async fn seats(&self, number: &str) -> CoreResult<Vec<Seat>> {
        let number = normalize_train_no(number)?;
        let seats = self.seats.list_seats(&number).await?;
        if seats.is_empty() {
            return Err(CoreError::NotFound(format!("Seats for train {}", number)));
        }
        Ok(seats)
    }

    pub async fn availability(&self, number: &str) -> CoreResult<Availability> {
        let train = self.find(number).await?;
        self.seats.availability(&train.number).await
    }

    /// Books the lowest-numbered free seat of `category` for `passenger`.
    ///
    /// Exhaustion is reported as `Unavailable`; nothing is written in that case.
    pub async fn book(
        &self,
        number: &str,
        passenger: Passenger,
        category: SeatCategory,
    ) -> CoreResult<SeatAllocation> {
        let number = normalize_train_no(number)?;
        let passenger = passenger.normalized()?;
        debug!(train = %number, %category, passenger = ?passenger.name, "Booking request");

        if self.trains.find(&number).await?.is_none() {
            return Err(CoreError::NotFound(format!("Train {}", number)));
        }

        let _guard = self.locks.acquire(&number).await;

        // A removal may have won the lock in between.
        if self.trains.find(&number).await?.is_none() {
            return Err(CoreError::NotFound(format!("Train {}", number)));
        }

        match self.seats.claim_seat(&number, category, &passenger).await? {
            Some(seat_number) => {
                info!("Booked seat {} ({}) on train {}", seat_number, category, number);
                Ok(SeatAllocation { seat_number, category })
            }
            None => Err(CoreError::Unavailable {
                train_no: number,
                category,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seat::seat_plan;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Keeps trains and seats side by side behind one mutex.
    #[derive(Default)]
    struct MemoryRailway {
        state: Mutex<BTreeMap<String, (Train, Vec<Seat>)>>,
    }

    #[async_trait]
    impl TrainRepository for MemoryRailway {
        async fn register(&self, train: &NewTrain) -> CoreResult<Train> {
            let mut state = self.state.lock().unwrap();
            if state.contains_key(&train.number) {
                return Err(CoreError::DuplicateKey(train.number.clone()));
            }
            let record = Train {
                number: train.number.clone(),
                name: train.name.clone(),
                origin: train.origin.clone(),
                destination: train.destination.clone(),
                created_at: Utc::now(),
            };
            let seats = seat_plan()
                .map(|(n, category)| Seat {
                    seat_number: n as i64,
                    category,
                    booked: false,
                    passenger_name: String::new(),
                    passenger_age: String::new(),
                    passenger_gender: String::new(),
                    booked_at: None,
                })
                .collect();
            state.insert(train.number.clone(), (record.clone(), seats));
            Ok(record)
        }

        async fn find(&self, number: &str) -> CoreResult<Option<Train>> {
            Ok(self.state.lock().unwrap().get(number).map(|(t, _)| t.clone()))
        }

        async fn list(&self) -> CoreResult<Vec<Train>> {
            Ok(self.state.lock().unwrap().values().map(|(t, _)| t.clone()).collect())
        }

        async fn remove(&self, number: &str) -> CoreResult<bool> {
            Ok(self.state.lock().unwrap().remove(number).is_some())
        }
    }

    #[async_trait]
    impl SeatRepository for MemoryRailway {
        async fn list_seats(&self, train_no: &str) -> CoreResult<Vec<Seat>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .get(train_no)
                .map(|(_, s)| s.clone())
                .unwrap_or_default())
        }

        async fn claim_seat(
            &self,
            train_no: &str,
            category: SeatCategory,
            passenger: &Passenger,
        ) -> CoreResult<Option<i64>> {
            let mut state = self.state.lock().unwrap();
            let Some((_, seats)) = state.get_mut(train_no) else {
                return Ok(None);
            };
            let seat = seats
                .iter_mut()
                .filter(|s| !s.booked && s.category == category)
                .min_by_key(|s| s.seat_number);
            Ok(seat.map(|s| {
                s.booked = true;
                s.passenger_name = passenger.name.expose().clone();
                s.passenger_age = passenger.age.clone();
                s.passenger_gender = passenger.gender.clone();
                s.booked_at = Some(Utc::now());
                s.seat_number
            }))
        }

        async fn availability(&self, train_no: &str) -> CoreResult<Availability> {
            let mut availability = Availability::default();
            if let Some((_, seats)) = self.state.lock().unwrap().get(train_no) {
                for category in SeatCategory::ALL {
                    let free = seats.iter().filter(|s| !s.booked && s.category == category).count();
                    availability.set(category, free as u32);
                }
            }
            Ok(availability)
        }
    }

    fn service() -> RailwayService {
        let repo = Arc::new(MemoryRailway::default());
        RailwayService::new(repo.clone(), repo)
    }

    #[tokio::test]
    async fn test_booking_takes_lowest_free_seat() {
        let svc = service();
        svc.register(NewTrain::new("Deccan Queen", "12123")).await.unwrap();

        let first = svc
            .book("12123", Passenger::new("A", "30", "F"), SeatCategory::Aisle)
            .await
            .unwrap();
        let second = svc
            .book("12123", Passenger::new("B", "31", "M"), SeatCategory::Aisle)
            .await
            .unwrap();

        assert_eq!(first.seat_number, 2);
        assert_eq!(second.seat_number, 3);
        assert_eq!(svc.availability("12123").await.unwrap().aisle, 78);
    }

    #[tokio::test]
    async fn test_unknown_train_and_name_mismatch() {
        let svc = service();
        svc.register(NewTrain::new("Deccan Queen", "12123")).await.unwrap();

        let err = svc
            .book("99999", Passenger::new("A", "30", "F"), SeatCategory::Window)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        assert!(svc.search("12123", None).await.is_ok());
        assert!(svc.search("12123", Some("Deccan Queen")).await.is_ok());
        assert!(matches!(
            svc.search("12123", Some("Pragati Express")).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_lock_registry_does_not_grow_with_unknown_trains() {
        let svc = service();
        svc.register(NewTrain::new("Deccan Queen", "12123")).await.unwrap();

        for i in 0..1000 {
            let err = svc
                .book(&format!("X{}", i), Passenger::new("A", "30", "F"), SeatCategory::Window)
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::NotFound(_)));
            assert!(svc.remove(&format!("Y{}", i)).await.is_err());
        }
        svc.book("12123", Passenger::new("B", "31", "M"), SeatCategory::Window)
            .await
            .unwrap();
        svc.remove("12123").await.unwrap();

        assert!(svc.locks.is_empty());
    }

    #[tokio::test]
    async fn test_middle_exhaustion_is_unavailable() {
        let svc = service();
        svc.register(NewTrain::new("Shatabdi", "12009")).await.unwrap();

        for _ in 0..40 {
            svc.book("12009", Passenger::new("P", "20", "M"), SeatCategory::Middle)
                .await
                .unwrap();
        }

        let err = svc
            .book("12009", Passenger::new("Late", "20", "M"), SeatCategory::Middle)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unavailable { category: SeatCategory::Middle, .. }));

        let availability = svc.availability("12009").await.unwrap();
        assert_eq!(availability.middle, 0);
        assert_eq!(availability.total(), 160);
    }

    #[tokio::test]
    async fn test_remove_then_reregister_is_fresh() {
        let svc = service();
        svc.register(NewTrain::new("Duronto", "12213")).await.unwrap();
        svc.book("12213", Passenger::new("A", "1", "F"), SeatCategory::Window)
            .await
            .unwrap();

        svc.remove("12213").await.unwrap();
        assert!(matches!(svc.seats("12213").await, Err(CoreError::NotFound(_))));
        assert!(matches!(svc.remove("12213").await, Err(CoreError::NotFound(_))));

        svc.register(NewTrain::new("Duronto", "12213")).await.unwrap();
        let seats = svc.seats("12213").await.unwrap();
        assert_eq!(seats.len(), 200);
        assert!(seats.iter().all(|s| !s.booked));
    }
}
