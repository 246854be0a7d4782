//! Facility store: filtered CRUD over the `facilities` table.

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::facility::{FacilityCreate, FacilityFilter, FacilityRecord};

const SELECT_COLUMNS: &str =
    "SELECT id, name, address, latitude, longitude, facility_type, city, country FROM facilities";

const INSERT_SQL: &str = "\
    INSERT INTO facilities (name, address, latitude, longitude, facility_type, city, country) \
    VALUES ($1, $2, $3, $4, $5, $6, $7) \
    RETURNING id, name, address, latitude, longitude, facility_type, city, country";

/// Inserts a facility and returns the stored record with its assigned id.
pub async fn insert(pool: &PgPool, facility: &FacilityCreate) -> Result<FacilityRecord, sqlx::Error> {
    sqlx::query_as::<_, FacilityRecord>(INSERT_SQL)
        .bind(&facility.name)
        .bind(&facility.address)
        .bind(facility.latitude)
        .bind(facility.longitude)
        .bind(&facility.facility_type)
        .bind(&facility.city)
        .bind(&facility.country)
        .fetch_one(pool)
        .await
}

/// Assembles the filtered SELECT; every supplied filter adds one conjunctive
/// predicate. Separate from `query` so the generated SQL can be asserted
/// without a database.
fn filter_query(filter: &FacilityFilter) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(SELECT_COLUMNS);
    builder.push(" WHERE 1=1");

    if let Some(min_lat) = filter.min_lat {
        builder.push(" AND latitude >= ").push_bind(min_lat);
    }
    if let Some(max_lat) = filter.max_lat {
        builder.push(" AND latitude <= ").push_bind(max_lat);
    }
    if let Some(min_lon) = filter.min_lon {
        builder.push(" AND longitude >= ").push_bind(min_lon);
    }
    if let Some(max_lon) = filter.max_lon {
        builder.push(" AND longitude <= ").push_bind(max_lon);
    }
    if let Some(facility_type) = &filter.facility_type {
        builder.push(" AND facility_type = ").push_bind(facility_type);
    }
    if let Some(city) = &filter.city {
        builder.push(" AND city = ").push_bind(city);
    }
    if let Some(country) = &filter.country {
        builder.push(" AND country = ").push_bind(country);
    }

    builder
}

/// Returns all facilities matching the supplied filters, combined
/// conjunctively. An empty filter returns every record.
pub async fn query(
    pool: &PgPool,
    filter: &FacilityFilter,
) -> Result<Vec<FacilityRecord>, sqlx::Error> {
    let mut builder = filter_query(filter);
    builder
        .build_query_as::<FacilityRecord>()
        .fetch_all(pool)
        .await
}

/// Fetches a facility by id; `None` when absent.
pub async fn get(pool: &PgPool, id: i64) -> Result<Option<FacilityRecord>, sqlx::Error> {
    sqlx::query_as::<_, FacilityRecord>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_sql(filter: &FacilityFilter) -> String {
        filter_query(filter).into_sql()
    }

    #[test]
    fn test_empty_filter_selects_everything() {
        assert_eq!(
            filter_sql(&FacilityFilter::default()),
            format!("{SELECT_COLUMNS} WHERE 1=1")
        );
    }

    #[test]
    fn test_type_only_filter_is_a_single_equality_predicate() {
        let filter = FacilityFilter {
            facility_type: Some("hospital".to_string()),
            ..FacilityFilter::default()
        };
        assert_eq!(
            filter_sql(&filter),
            format!("{SELECT_COLUMNS} WHERE 1=1 AND facility_type = $1")
        );
    }

    #[test]
    fn test_bbox_filter_bounds_both_axes() {
        let filter = FacilityFilter {
            min_lat: Some(42.80),
            max_lat: Some(42.90),
            min_lon: Some(74.50),
            max_lon: Some(74.70),
            ..FacilityFilter::default()
        };
        assert_eq!(
            filter_sql(&filter),
            format!(
                "{SELECT_COLUMNS} WHERE 1=1 AND latitude >= $1 AND latitude <= $2 \
                 AND longitude >= $3 AND longitude <= $4"
            )
        );
    }

    #[test]
    fn test_all_filters_combine_conjunctively_in_order() {
        let filter = FacilityFilter {
            min_lat: Some(42.80),
            max_lat: Some(42.90),
            min_lon: Some(74.50),
            max_lon: Some(74.70),
            facility_type: Some("school".to_string()),
            city: Some("Bishkek".to_string()),
            country: Some("Kyrgyzstan".to_string()),
        };
        assert_eq!(
            filter_sql(&filter),
            format!(
                "{SELECT_COLUMNS} WHERE 1=1 AND latitude >= $1 AND latitude <= $2 \
                 AND longitude >= $3 AND longitude <= $4 AND facility_type = $5 \
                 AND city = $6 AND country = $7"
            )
        );
    }

    // The insert statement must hand back exactly the rows `get` would fetch,
    // so a created record round-trips through a fetch by its returned id.
    #[test]
    fn test_insert_returns_the_select_columns() {
        let columns = SELECT_COLUMNS
            .strip_prefix("SELECT ")
            .and_then(|s| s.strip_suffix(" FROM facilities"))
            .unwrap();
        let returning = INSERT_SQL.split("RETURNING").nth(1).unwrap().trim();
        assert_eq!(returning, columns);
    }

    #[test]
    fn test_insert_binds_every_column_except_id() {
        let columns = SELECT_COLUMNS
            .strip_prefix("SELECT ")
            .and_then(|s| s.strip_suffix(" FROM facilities"))
            .unwrap();
        let inserted = INSERT_SQL
            .split('(')
            .nth(1)
            .unwrap()
            .split(')')
            .next()
            .unwrap();
        assert_eq!(inserted, columns.strip_prefix("id, ").unwrap());
        for n in 1..=inserted.split(", ").count() {
            assert!(INSERT_SQL.contains(&format!("${n}")));
        }
    }
}
