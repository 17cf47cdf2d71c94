use model::{agency::Agency, WithId};
use utility::id::Id;

#[derive(Debug, sqlx::FromRow)]
pub struct AgencyRow {
    pub id: String,
    pub name: String,
    pub url: String,
    pub timezone: String,
    pub lang: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub fare_url: Option<String>,
}

impl From<AgencyRow> for WithId<Agency> {
    fn from(row: AgencyRow) -> Self {
        WithId::new(
            Id::new(row.id),
            Agency {
                name: row.name,
                url: row.url,
                timezone: row.timezone,
                lang: row.lang,
                phone: row.phone,
                email: row.email,
                fare_url: row.fare_url,
            },
        )
    }
}
