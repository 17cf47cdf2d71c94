use std::env;

use async_trait::async_trait;
use chrono::NaiveDate;
use model::{
    agency::Agency,
    calendar::{Calendar, CalendarException, Service},
    route::Route,
    shape::{Shape, ShapePoint},
    stop::Stop,
    trip::{StopTime, Trip},
    WithId,
};
use transit_engine::store::{BlockTripRow, ScheduleStore, StoreResult};
use utility::{geo::BoundingBox, id::Id};

pub mod error;
pub mod queries;
pub mod rows;

pub use queries::problem_report::{NewProblemReport, ProblemReport, ReportCode};

pub struct DatabaseConnectionInfo {
    pub username: String,
    pub password: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConnectionInfo {
    pub fn from_env() -> Option<Self> {
        let username = env::var("DATABASE_USER").ok()?;
        let password = env::var("DATABASE_PASSWORD").ok()?;
        let hostname = env::var("DATABASE_HOST").ok()?;
        let port: u16 = env::var("DATABASE_PORT").ok()?.parse().ok()?;
        let database = env::var("DATABASE_NAME").ok()?;
        Some(Self {
            username,
            password,
            hostname,
            port,
            database,
        })
    }

    fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.hostname, self.port, self.database
        )
    }
}

#[derive(Clone)]
pub struct PgDatabase {
    pool: sqlx::PgPool,
}

impl PgDatabase {
    pub async fn connect(info: &DatabaseConnectionInfo) -> Result<Self, sqlx::Error> {
        tracing::info!(host = %info.hostname, database = %info.database, "connecting to schedule store");
        let pool = sqlx::postgres::PgPool::connect(&info.postgres_url()).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|why| sqlx::Error::Migrate(Box::new(why)))?;
        tracing::info!("schedule store migrations up to date");
        Ok(Self { pool })
    }

    pub async fn report_problem(&self, report: NewProblemReport) -> StoreResult<ProblemReport> {
        queries::problem_report::insert(&self.pool, report).await
    }

    pub async fn problem_reports_for_stop(&self, stop_id: &str) -> StoreResult<Vec<ProblemReport>> {
        queries::problem_report::for_stop(&self.pool, stop_id).await
    }

    pub async fn problem_reports_for_trip(&self, trip_id: &str) -> StoreResult<Vec<ProblemReport>> {
        queries::problem_report::for_trip(&self.pool, trip_id).await
    }
}

#[async_trait]
impl ScheduleStore for PgDatabase {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(error::convert_error)?;
        Ok(())
    }

    async fn get_agency(&self, id: &Id<Agency>) -> StoreResult<Option<WithId<Agency>>> {
        queries::agency::get(&self.pool, id).await
    }

    async fn get_route(&self, id: &Id<Route>) -> StoreResult<Option<WithId<Route>>> {
        queries::route::get(&self.pool, id).await
    }

    async fn get_stop(&self, id: &Id<Stop>) -> StoreResult<Option<WithId<Stop>>> {
        queries::stop::get(&self.pool, id).await
    }

    async fn get_trip(&self, id: &Id<Trip>) -> StoreResult<Option<WithId<Trip>>> {
        queries::trip::get(&self.pool, id).await
    }

    async fn get_shape(&self, id: &Id<Shape>) -> StoreResult<Option<Vec<ShapePoint>>> {
        queries::shape::get(&self.pool, id).await
    }

    async fn get_routes(&self, ids: &[Id<Route>]) -> StoreResult<Vec<WithId<Route>>> {
        queries::route::get_many(&self.pool, ids).await
    }

    async fn get_stops(&self, ids: &[Id<Stop>]) -> StoreResult<Vec<WithId<Stop>>> {
        queries::stop::get_many(&self.pool, ids).await
    }

    async fn get_trips(&self, ids: &[Id<Trip>]) -> StoreResult<Vec<WithId<Trip>>> {
        queries::trip::get_many(&self.pool, ids).await
    }

    async fn get_agencies(&self, ids: &[Id<Agency>]) -> StoreResult<Vec<WithId<Agency>>> {
        queries::agency::get_many(&self.pool, ids).await
    }

    async fn stops_for_agency(&self, agency_id: &Id<Agency>) -> StoreResult<Vec<WithId<Stop>>> {
        queries::stop::for_agency(&self.pool, agency_id).await
    }

    async fn routes_for_agency(&self, agency_id: &Id<Agency>) -> StoreResult<Vec<WithId<Route>>> {
        queries::route::for_agency(&self.pool, agency_id).await
    }

    async fn stops_in_bounds(&self, bounds: BoundingBox) -> StoreResult<Vec<WithId<Stop>>> {
        queries::stop::in_bounds(&self.pool, bounds).await
    }

    async fn routes_serving_stop(&self, stop_id: &Id<Stop>) -> StoreResult<Vec<WithId<Route>>> {
        queries::route::serving_stop(&self.pool, stop_id).await
    }

    async fn stop_times_for_trip(&self, trip_id: &Id<Trip>) -> StoreResult<Vec<StopTime>> {
        queries::trip::stop_times_for_trip(&self.pool, trip_id).await
    }

    async fn stop_times_at_stop_in_window(
        &self,
        stop_id: &Id<Stop>,
        window_start_nanos: i64,
        window_end_nanos: i64,
    ) -> StoreResult<Vec<StopTime>> {
        queries::trip::stop_times_at_stop_in_window(
            &self.pool,
            stop_id,
            window_start_nanos,
            window_end_nanos,
        )
        .await
    }

    async fn calendar_for_service(&self, service_id: &Id<Service>) -> StoreResult<Option<Calendar>> {
        queries::service::calendar_for_service(&self.pool, service_id).await
    }

    async fn calendar_exceptions_for_service(
        &self,
        service_id: &Id<Service>,
    ) -> StoreResult<Vec<CalendarException>> {
        queries::service::calendar_exceptions_for_service(&self.pool, service_id).await
    }

    async fn active_service_ids(
        &self,
        agency_id: &Id<Agency>,
        date: NaiveDate,
    ) -> StoreResult<Vec<Id<Service>>> {
        queries::service::active_service_ids(&self.pool, agency_id, date).await
    }

    async fn trips_for_block(
        &self,
        agency_id: &Id<Agency>,
        block_id: &str,
    ) -> StoreResult<Vec<BlockTripRow>> {
        queries::trip::trips_for_block(&self.pool, agency_id, block_id).await
    }

    async fn search_routes(&self, sanitized_query: &str, limit: usize) -> StoreResult<Vec<WithId<Route>>> {
        queries::route::search(&self.pool, sanitized_query, limit as i64).await
    }

    async fn search_stops(&self, sanitized_query: &str, limit: usize) -> StoreResult<Vec<WithId<Stop>>> {
        queries::stop::search(&self.pool, sanitized_query, limit as i64).await
    }
}
