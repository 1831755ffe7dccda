use async_trait::async_trait;
use sea_orm::{
    sea_query::{Expr, SimpleExpr},
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use tracing::debug;

use models::provider::{self, Entity as ProviderEntity, Provider};

use crate::errors::ServiceError;

/// Read access to the provider collection.
///
/// `term` is `None` for an unfiltered listing. Otherwise a provider matches
/// when `term` is a case-insensitive substring of its name or of any of its
/// specialties. Listings are ordered by name, then id.
#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn count_matching(&self, term: Option<&str>) -> Result<u64, ServiceError>;
    async fn find_matching(&self, term: Option<&str>, offset: u64, limit: u64) -> Result<Vec<Provider>, ServiceError>;
    async fn get(&self, id: &str) -> Result<Option<Provider>, ServiceError>;
}

/// SeaORM-backed repository over the `providers_index` table.
pub struct SeaOrmProviderRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmProviderRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

/// `%term%` with LIKE metacharacters escaped so the term matches literally.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn search_condition(term: &str) -> SimpleExpr {
    let pattern = like_pattern(term);
    // EXISTS keeps a provider with several matching specialties a single row.
    Expr::cust_with_values(
        r#"("name" ILIKE $1 OR EXISTS (SELECT 1 FROM unnest("specialties") AS s WHERE s ILIKE $2))"#,
        [pattern.clone(), pattern],
    )
}

/// Row reader with NULL array elements stripped, so a `{CBT,NULL}` array
/// decodes as `["CBT"]` instead of failing the whole page.
fn provider_rows() -> Select<ProviderEntity> {
    ProviderEntity::find()
        .select_only()
        .columns([provider::Column::Id, provider::Column::Name, provider::Column::City, provider::Column::State])
        .column_as(Expr::cust(r#"array_remove("specialties", NULL)"#), "specialties")
}

fn matching(term: Option<&str>) -> Select<ProviderEntity> {
    let finder = provider_rows();
    match term {
        Some(t) => finder.filter(search_condition(t)),
        None => finder,
    }
}

#[async_trait]
impl ProviderRepository for SeaOrmProviderRepository {
    async fn count_matching(&self, term: Option<&str>) -> Result<u64, ServiceError> {
        let total = matching(term).count(&self.db).await?;
        Ok(total)
    }

    async fn find_matching(&self, term: Option<&str>, offset: u64, limit: u64) -> Result<Vec<Provider>, ServiceError> {
        let rows = matching(term)
            .order_by_asc(provider::Column::Name)
            .order_by_asc(provider::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        debug!(rows = rows.len(), offset, limit, "providers fetched");
        rows.into_iter()
            .map(|r| Provider::try_from(r).map_err(ServiceError::from))
            .collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Provider>, ServiceError> {
        let found = provider_rows()
            .filter(provider::Column::Id.eq(id))
            .one(&self.db)
            .await?;
        found.map(Provider::try_from).transpose().map_err(ServiceError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
    use uuid::Uuid;

    #[test]
    fn like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("cbt"), "%cbt%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(like_pattern(""), "%%");
    }

    async fn insert(db: &DatabaseConnection, tag: &str, name: &str, specialties: Option<Vec<&str>>) -> Result<String, anyhow::Error> {
        let id = format!("{tag}-{}", Uuid::new_v4());
        provider::ActiveModel {
            id: Set(id.clone()),
            name: Set(name.to_string()),
            city: Set(Some("Austin".into())),
            state: Set(Some("TX".into())),
            specialties: Set(specialties.map(|v| v.into_iter().map(String::from).collect())),
        }
        .insert(db)
        .await?;
        Ok(id)
    }

    #[tokio::test]
    async fn seaorm_repository_filters_orders_and_pages() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() { return Ok(()); }
        let db = get_db().await?;

        // Unique marker keeps this test isolated from other rows in the table.
        let marker = format!("zq{}", &Uuid::new_v4().simple().to_string()[..8]);
        let b = insert(&db, &marker, &format!("B {marker}"), Some(vec!["CBT", "Trauma"])).await?;
        let a = insert(&db, &marker, &format!("A {marker}"), None).await?;
        let c = insert(&db, &marker, "C unrelated", Some(vec![&format!("{} CBT", marker.to_uppercase())])).await?;

        let repo = SeaOrmProviderRepository::new(db.clone());
        let term = marker.to_uppercase();
        assert_eq!(repo.count_matching(Some(&term)).await?, 3);

        let first = repo.find_matching(Some(&term), 0, 2).await?;
        let names: Vec<String> = first.iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec![format!("A {marker}"), format!("B {marker}")]);
        assert!(first[0].specialties.is_empty());

        let second = repo.find_matching(Some(&term), 2, 2).await?;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, c);

        assert!(repo.find_matching(Some(&term), 3, 2).await?.is_empty());

        let got = repo.get(&b).await?.expect("inserted provider");
        assert_eq!(got.specialties, vec!["CBT".to_string(), "Trauma".to_string()]);
        assert!(repo.get(&format!("{marker}-missing")).await?.is_none());

        // cleanup
        ProviderEntity::delete_many()
            .filter(provider::Column::Id.is_in([a, b, c]))
            .exec(&db)
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn seaorm_repository_treats_wildcards_literally() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() { return Ok(()); }
        let db = get_db().await?;

        let marker = format!("wq{}", &Uuid::new_v4().simple().to_string()[..8]);
        let id = insert(&db, &marker, &format!("{marker} 100% Care"), None).await?;
        let repo = SeaOrmProviderRepository::new(db.clone());

        assert_eq!(repo.count_matching(Some(&format!("{marker} 100%"))).await?, 1);
        assert_eq!(repo.count_matching(Some(&format!("{marker}_"))).await?, 0);

        ProviderEntity::delete_by_id(id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn seaorm_repository_drops_null_specialty_elements() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() { return Ok(()); }
        let db = get_db().await?;

        let marker = format!("nq{}", &Uuid::new_v4().simple().to_string()[..8]);
        let id = format!("{marker}-1");
        db.execute_unprepared(&format!(
            "INSERT INTO providers_index (id, name, city, state, specialties) \
             VALUES ('{id}', '{marker} name', 'Austin', 'TX', ARRAY['CBT', NULL])"
        ))
        .await?;

        let repo = SeaOrmProviderRepository::new(db.clone());
        assert_eq!(repo.count_matching(Some(&marker)).await?, 1);
        let found = repo.find_matching(Some(&marker), 0, 10).await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].specialties, vec!["CBT".to_string()]);
        let got = repo.get(&id).await?.expect("inserted provider");
        assert_eq!(got.specialties, vec!["CBT".to_string()]);

        ProviderEntity::delete_by_id(id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn seaorm_repository_accepts_empty_name() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() { return Ok(()); }
        let db = get_db().await?;

        let marker = format!("eq{}", &Uuid::new_v4().simple().to_string()[..8]);
        let id = insert(&db, &marker, "", Some(vec![&marker])).await?;
        let repo = SeaOrmProviderRepository::new(db.clone());

        let found = repo.find_matching(Some(&marker), 0, 10).await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "");

        ProviderEntity::delete_by_id(id).exec(&db).await?;
        Ok(())
    }
}
