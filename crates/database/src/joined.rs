//! Decoding of joined rows.
//!
//! Joined reads select the related table's columns under a fixed alias
//! prefix (`c_` for clients, `op_` for opportunities). A left join with no
//! match yields a NULL id, which decodes as `None`.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::models::{Client, Opportunity};

/// Client columns aliased with the `c_` prefix, for a join on alias `c`.
pub(crate) const CLIENT_JOIN_COLUMNS: &str = "c.id AS c_id, c.user_id AS c_user_id, \
    c.name AS c_name, c.email AS c_email, c.phone AS c_phone, c.company AS c_company, \
    c.position AS c_position, c.notes AS c_notes, c.status AS c_status, \
    c.created_at AS c_created_at, c.updated_at AS c_updated_at";

/// Opportunity columns aliased with the `op_` prefix, for a join on alias `op`.
pub(crate) const OPPORTUNITY_JOIN_COLUMNS: &str = "op.id AS op_id, op.user_id AS op_user_id, \
    op.client_id AS op_client_id, op.title AS op_title, op.description AS op_description, \
    op.value AS op_value, op.stage AS op_stage, op.probability AS op_probability, \
    op.expected_close_date AS op_expected_close_date, op.created_at AS op_created_at, \
    op.updated_at AS op_updated_at";

pub(crate) fn joined_client(row: &SqliteRow) -> Result<Option<Client>, sqlx::Error> {
    let Some(id) = row.try_get::<Option<String>, _>("c_id")? else {
        return Ok(None);
    };

    Ok(Some(Client {
        id,
        user_id: row.try_get("c_user_id")?,
        name: row.try_get("c_name")?,
        email: row.try_get("c_email")?,
        phone: row.try_get("c_phone")?,
        company: row.try_get("c_company")?,
        position: row.try_get("c_position")?,
        notes: row.try_get("c_notes")?,
        status: row.try_get("c_status")?,
        created_at: row.try_get("c_created_at")?,
        updated_at: row.try_get("c_updated_at")?,
    }))
}

pub(crate) fn joined_opportunity(row: &SqliteRow) -> Result<Option<Opportunity>, sqlx::Error> {
    let Some(id) = row.try_get::<Option<String>, _>("op_id")? else {
        return Ok(None);
    };

    Ok(Some(Opportunity {
        id,
        user_id: row.try_get("op_user_id")?,
        client_id: row.try_get("op_client_id")?,
        client: None,
        title: row.try_get("op_title")?,
        description: row.try_get("op_description")?,
        value: row.try_get("op_value")?,
        stage: row.try_get("op_stage")?,
        probability: row.try_get("op_probability")?,
        expected_close_date: row.try_get("op_expected_close_date")?,
        created_at: row.try_get("op_created_at")?,
        updated_at: row.try_get("op_updated_at")?,
    }))
}
