use crate::entities::{Business, BusinessType, Plot};
use crate::pricing::{zone_for, GridConfig, Zone};
use crate::treasury::TreasuryStats;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Snapshot hash of a plot row, used to skip unchanged re-imports
pub fn plot_snapshot_hash(plot: &Plot) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}|{}|{}|{}|{}|{}",
        plot.x,
        plot.y,
        plot.owner.as_deref().unwrap_or(""),
        plot.business_id.as_deref().unwrap_or(""),
        plot.zone.as_str(),
        plot.price.map(|p| p.to_bits().to_string()).unwrap_or_default()
    ));
    format!("{:x}", hasher.finalize())
}

/// Event for audit trail: every stored change is recorded
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

pub fn plot_entity_id(x: i32, y: i32) -> String {
    format!("{},{}", x, y)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Plot snapshots (one row per grid cell)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS plots (
            x INTEGER NOT NULL,
            y INTEGER NOT NULL,
            owner TEXT,
            business_id TEXT,
            zone TEXT NOT NULL,
            price REAL,
            snapshot_hash TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (x, y)
        )",
        [],
    )?;

    // ==========================================================================
    // Business snapshots
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS businesses (
            id TEXT PRIMARY KEY,
            business_type TEXT NOT NULL,
            level INTEGER NOT NULL,
            base_income REAL,
            connections INTEGER NOT NULL,
            owner TEXT NOT NULL,
            plot_x INTEGER NOT NULL,
            plot_y INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Treasury snapshots (append-only)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS treasury_snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            snapshot_id TEXT UNIQUE NOT NULL,
            taken_at TEXT NOT NULL,
            stats TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_plots_owner ON plots(owner)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_businesses_owner ON businesses(owner)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_treasury_taken_at ON treasury_snapshots(taken_at)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// CSV IMPORT
// ============================================================================

#[derive(Debug, Deserialize)]
struct PlotRow {
    x: i32,
    y: i32,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    business_id: Option<String>,
    #[serde(default)]
    zone: Option<String>,
    #[serde(default)]
    price: Option<f64>,
}

/// Load plots from CSV (`x,y,owner,business_id,zone,price`).
/// Empty owner/business cells mean none; a missing zone is derived.
pub fn load_plots_csv(csv_path: &Path, grid: &GridConfig) -> Result<Vec<Plot>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;

    let mut plots = Vec::new();

    for (line, result) in rdr.deserialize().enumerate() {
        let row: PlotRow = result.with_context(|| format!("Failed to deserialize plot on row {}", line + 1))?;

        let zone = match row.zone.as_deref().map(str::trim).filter(|z| !z.is_empty()) {
            Some(z) => z
                .parse::<Zone>()
                .with_context(|| format!("Invalid zone on row {}", line + 1))?,
            None => zone_for(row.x, row.y, grid),
        };

        plots.push(Plot {
            x: row.x,
            y: row.y,
            owner: row.owner.filter(|o| !o.trim().is_empty()),
            business_id: row.business_id.filter(|b| !b.trim().is_empty()),
            zone,
            price: row.price,
        });
    }

    tracing::info!(count = plots.len(), path = ?csv_path, "loaded plots from CSV");
    Ok(plots)
}

// ============================================================================
// PLOTS
// ============================================================================

/// Upsert plot snapshots. Returns how many rows were new or changed.
pub fn insert_plots(conn: &Connection, plots: &[Plot]) -> Result<usize> {
    let mut changed = 0;
    let mut unchanged = 0;
    let now = Utc::now().to_rfc3339();

    for plot in plots {
        let hash = plot_snapshot_hash(plot);

        let existing: Option<String> = conn
            .query_row(
                "SELECT snapshot_hash FROM plots WHERE x = ?1 AND y = ?2",
                params![plot.x, plot.y],
                |row| row.get(0),
            )
            .optional()?;

        if existing.as_deref() == Some(hash.as_str()) {
            unchanged += 1;
            continue;
        }

        conn.execute(
            "INSERT INTO plots (x, y, owner, business_id, zone, price, snapshot_hash, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(x, y) DO UPDATE SET
                owner = excluded.owner,
                business_id = excluded.business_id,
                zone = excluded.zone,
                price = excluded.price,
                snapshot_hash = excluded.snapshot_hash,
                updated_at = excluded.updated_at",
            params![
                plot.x,
                plot.y,
                plot.owner,
                plot.business_id,
                plot.zone.as_str(),
                plot.price,
                hash,
                now,
            ],
        )?;

        changed += 1;

        let event = Event::new(
            if existing.is_some() { "plot_updated" } else { "plot_added" },
            "plot",
            &plot_entity_id(plot.x, plot.y),
            serde_json::json!({
                "owner": plot.owner,
                "business_id": plot.business_id,
                "zone": plot.zone,
            }),
            "snapshot_importer",
        );
        insert_event(conn, &event)?;
    }

    tracing::debug!(changed, unchanged, "stored plot snapshots");
    Ok(changed)
}

fn plot_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Plot> {
    let zone_str: String = row.get(4)?;
    let zone = zone_str.parse::<Zone>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(Plot {
        x: row.get(0)?,
        y: row.get(1)?,
        owner: row.get(2)?,
        business_id: row.get(3)?,
        zone,
        price: row.get(5)?,
    })
}

pub fn get_all_plots(conn: &Connection) -> Result<Vec<Plot>> {
    let mut stmt = conn.prepare(
        "SELECT x, y, owner, business_id, zone, price
         FROM plots
         ORDER BY y, x",
    )?;

    let plots = stmt
        .query_map([], plot_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(plots)
}

pub fn get_plot_by_coords(conn: &Connection, x: i32, y: i32) -> Result<Option<Plot>> {
    let plot = conn
        .query_row(
            "SELECT x, y, owner, business_id, zone, price FROM plots WHERE x = ?1 AND y = ?2",
            params![x, y],
            plot_from_row,
        )
        .optional()?;

    Ok(plot)
}

pub fn get_plots_by_owner(conn: &Connection, owner: &str) -> Result<Vec<Plot>> {
    let mut stmt = conn.prepare(
        "SELECT x, y, owner, business_id, zone, price
         FROM plots
         WHERE owner = ?1
         ORDER BY y, x",
    )?;

    let plots = stmt
        .query_map([owner], plot_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(plots)
}

/// Mirror a confirmed purchase into the local snapshot.
///
/// Unknown plots are created from the grid; owned plots are rejected.
pub fn record_purchase(conn: &Connection, x: i32, y: i32, owner: &str, grid: &GridConfig) -> Result<Plot> {
    if !grid.contains(x, y) {
        bail!("Plot ({}, {}) is outside the grid", x, y);
    }

    let mut plot = match get_plot_by_coords(conn, x, y)? {
        Some(p) => p,
        None => Plot::new(x, y, grid),
    };

    if let Some(current) = &plot.owner {
        bail!("Plot ({}, {}) is already owned by {}", x, y, current);
    }

    plot.owner = Some(owner.to_string());
    insert_plots(conn, std::slice::from_ref(&plot))?;

    let event = Event::new(
        "plot_purchased",
        "plot",
        &plot_entity_id(x, y),
        serde_json::json!({ "owner": owner }),
        owner,
    );
    insert_event(conn, &event)?;

    Ok(plot)
}

pub fn count_plots(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM plots", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// BUSINESSES
// ============================================================================

pub fn insert_businesses(conn: &Connection, businesses: &[Business]) -> Result<usize> {
    let now = Utc::now().to_rfc3339();

    for business in businesses {
        conn.execute(
            "INSERT INTO businesses (id, business_type, level, base_income, connections, owner, plot_x, plot_y, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                business_type = excluded.business_type,
                level = excluded.level,
                base_income = excluded.base_income,
                connections = excluded.connections,
                owner = excluded.owner,
                plot_x = excluded.plot_x,
                plot_y = excluded.plot_y,
                updated_at = excluded.updated_at",
            params![
                business.id,
                business.business_type.as_str(),
                business.level,
                business.base_income,
                business.connections,
                business.owner,
                business.plot_x,
                business.plot_y,
                now,
            ],
        )?;
    }

    tracing::debug!(count = businesses.len(), "stored business snapshots");
    Ok(businesses.len())
}

fn business_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Business> {
    let type_str: String = row.get(1)?;
    let business_type = type_str.parse::<BusinessType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(Business {
        id: row.get(0)?,
        business_type,
        level: row.get(2)?,
        base_income: row.get(3)?,
        connections: row.get(4)?,
        owner: row.get(5)?,
        plot_x: row.get(6)?,
        plot_y: row.get(7)?,
    })
}

pub fn get_all_businesses(conn: &Connection) -> Result<Vec<Business>> {
    let mut stmt = conn.prepare(
        "SELECT id, business_type, level, base_income, connections, owner, plot_x, plot_y
         FROM businesses
         ORDER BY id",
    )?;

    let businesses = stmt
        .query_map([], business_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(businesses)
}

pub fn get_businesses_by_owner(conn: &Connection, owner: &str) -> Result<Vec<Business>> {
    let mut stmt = conn.prepare(
        "SELECT id, business_type, level, base_income, connections, owner, plot_x, plot_y
         FROM businesses
         WHERE owner = ?1
         ORDER BY id",
    )?;

    let businesses = stmt
        .query_map([owner], business_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(businesses)
}

// ============================================================================
// TREASURY SNAPSHOTS
// ============================================================================

pub fn insert_treasury_snapshot(conn: &Connection, stats: &TreasuryStats, taken_at: DateTime<Utc>) -> Result<String> {
    let snapshot_id = uuid::Uuid::new_v4().to_string();
    let stats_json = serde_json::to_string(stats)?;

    conn.execute(
        "INSERT INTO treasury_snapshots (snapshot_id, taken_at, stats) VALUES (?1, ?2, ?3)",
        params![snapshot_id, taken_at.to_rfc3339(), stats_json],
    )?;

    Ok(snapshot_id)
}

/// Most recent treasury snapshot with the time it was taken
pub fn latest_treasury_snapshot(conn: &Connection) -> Result<Option<(DateTime<Utc>, TreasuryStats)>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT taken_at, stats FROM treasury_snapshots ORDER BY taken_at DESC, id DESC LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match row {
        Some((taken_at, stats_json)) => {
            let taken_at = DateTime::parse_from_rfc3339(&taken_at)
                .context("Corrupt treasury snapshot timestamp")?
                .with_timezone(&Utc);
            let stats = serde_json::from_str(&stats_json).context("Corrupt treasury snapshot")?;
            Ok(Some((taken_at, stats)))
        }
        None => Ok(None),
    }
}

/// Time of the first treasury snapshot, used as the launch date for averages
pub fn first_treasury_snapshot_time(conn: &Connection) -> Result<Option<DateTime<Utc>>> {
    let taken_at: Option<String> = conn
        .query_row(
            "SELECT taken_at FROM treasury_snapshots ORDER BY taken_at ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    taken_at
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .context("Corrupt treasury snapshot timestamp")
        })
        .transpose()
}

// ============================================================================
// EVENTS
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
                    })?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PlotStatus;
    use crate::pricing::plot_price;
    use chrono::{Duration, TimeZone};
    use std::io::Write;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let conn = open();
        let grid = GridConfig::default();
        let plots = vec![Plot::new(0, 0, &grid), Plot::new(50, 50, &grid), Plot::new(10, 90, &grid)];

        let first = insert_plots(&conn, &plots).unwrap();
        let second = insert_plots(&conn, &plots).unwrap();

        assert_eq!(first, 3);
        assert_eq!(second, 0, "unchanged snapshots must not be rewritten");
        assert_eq!(count_plots(&conn).unwrap(), 3);

        println!("✅ Plot snapshot idempotency test PASSED");
    }

    #[test]
    fn test_changed_plot_is_updated() {
        let conn = open();
        let grid = GridConfig::default();
        let mut plot = Plot::new(5, 5, &grid);
        insert_plots(&conn, &[plot.clone()]).unwrap();

        plot.owner = Some("EQalice".to_string());
        assert_eq!(insert_plots(&conn, &[plot]).unwrap(), 1);

        let stored = get_plot_by_coords(&conn, 5, 5).unwrap().unwrap();
        assert_eq!(stored.owner.as_deref(), Some("EQalice"));
        assert_eq!(count_plots(&conn).unwrap(), 1);

        let events = get_events_for_entity(&conn, "plot", "5,5").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "plot_updated");
    }

    #[test]
    fn test_price_change_is_stored() {
        let conn = open();
        let grid = GridConfig::default();
        let mut plot = Plot::new(5, 5, &grid);
        plot.price = Some(20.0);
        insert_plots(&conn, &[plot.clone()]).unwrap();

        plot.price = Some(45.0);
        assert_eq!(insert_plots(&conn, &[plot]).unwrap(), 1);

        let stored = get_plot_by_coords(&conn, 5, 5).unwrap().unwrap();
        assert_eq!(stored.price, Some(45.0));
        assert_eq!(stored.quote(&grid).price, 45.0);
    }

    #[test]
    fn test_snapshot_hash() {
        let grid = GridConfig::default();
        let plot = Plot::new(3, 4, &grid);
        let mut owned = plot.clone();
        owned.owner = Some("EQbob".to_string());

        assert_eq!(plot_snapshot_hash(&plot), plot_snapshot_hash(&plot));
        assert_ne!(plot_snapshot_hash(&plot), plot_snapshot_hash(&owned));
        assert_eq!(plot_snapshot_hash(&plot).len(), 64);
    }

    #[test]
    fn test_purchase_flips_status_to_owned() {
        let conn = open();
        let grid = GridConfig::default();
        insert_plots(&conn, &[Plot::new(50, 50, &grid)]).unwrap();

        // Before purchase: center plot, full price, available
        let before = get_plot_by_coords(&conn, 50, 50).unwrap().unwrap();
        assert!((plot_price(before.x, before.y, &grid) - 100.0).abs() < 0.01);
        assert_eq!(before.status_for(Some("EQalice")), PlotStatus::Available);

        record_purchase(&conn, 50, 50, "EQalice", &grid).unwrap();

        // After purchase: the reloaded snapshot reflects ownership
        let after = get_plot_by_coords(&conn, 50, 50).unwrap().unwrap();
        assert!(after.status_for(Some("EQalice")).is_owned());
        assert_eq!(
            after.status_for(Some("EQbob")),
            PlotStatus::OwnedByOther { has_business: false }
        );

        // Ownership is exclusive
        assert!(record_purchase(&conn, 50, 50, "EQbob", &grid).is_err());
        assert!(record_purchase(&conn, 100, 0, "EQbob", &grid).is_err());

        let events = get_events_for_entity(&conn, "plot", "50,50").unwrap();
        assert!(events.iter().any(|e| e.event_type == "plot_purchased"));

        println!("✅ Purchase state reflection test PASSED");
    }

    #[test]
    fn test_purchase_of_unknown_plot_creates_it() {
        let conn = open();
        let grid = GridConfig::default();

        let plot = record_purchase(&conn, 7, 8, "EQcarol", &grid).unwrap();
        assert_eq!(plot.zone, zone_for(7, 8, &grid));
        assert_eq!(get_plots_by_owner(&conn, "EQcarol").unwrap().len(), 1);
    }

    #[test]
    fn test_businesses_round_trip() {
        let conn = open();
        let mut farm = Business::new("b1", BusinessType::Farm, "EQalice", 1, 1);
        farm.level = 3;
        farm.connections = 2;

        insert_businesses(&conn, &[farm.clone()]).unwrap();
        farm.level = 4;
        insert_businesses(&conn, &[farm.clone()]).unwrap();

        let stored = get_all_businesses(&conn).unwrap();
        assert_eq!(stored, vec![farm.clone()]);

        let shop = Business::new("b2", BusinessType::Shop, "EQbob", 2, 2);
        insert_businesses(&conn, &[shop]).unwrap();
        assert_eq!(get_businesses_by_owner(&conn, "EQalice").unwrap(), vec![farm]);
        assert_eq!(get_all_businesses(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_latest_treasury_snapshot() {
        let conn = open();
        assert!(latest_treasury_snapshot(&conn).unwrap().is_none());

        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let old = TreasuryStats {
            total_deposits: 10.0,
            ..TreasuryStats::default()
        };
        let new = TreasuryStats {
            total_deposits: 99.0,
            ..TreasuryStats::default()
        };

        insert_treasury_snapshot(&conn, &old, t0).unwrap();
        insert_treasury_snapshot(&conn, &new, t0 + Duration::days(3)).unwrap();

        let (taken_at, stats) = latest_treasury_snapshot(&conn).unwrap().unwrap();
        assert_eq!(taken_at, t0 + Duration::days(3));
        assert_eq!(stats.total_deposits, 99.0);
        assert_eq!(first_treasury_snapshot_time(&conn).unwrap(), Some(t0));
    }

    #[test]
    fn test_load_plots_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "x,y,owner,business_id,zone,price").unwrap();
        writeln!(file, "50,50,EQalice,b1,center,100").unwrap();
        writeln!(file, "0,0,,,,").unwrap();

        let plots = load_plots_csv(file.path(), &GridConfig::default()).unwrap();

        assert_eq!(plots.len(), 2);
        assert_eq!(plots[0].owner.as_deref(), Some("EQalice"));
        assert_eq!(plots[0].price, Some(100.0));
        assert_eq!(plots[1].owner, None);
        assert_eq!(plots[1].zone, Zone::Outskirts);
    }

    #[test]
    fn test_bad_zone_reports_row() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "x,y,owner,business_id,zone,price").unwrap();
        writeln!(file, "1,1,,,center,").unwrap();
        writeln!(file, "2,2,,,downtown,").unwrap();

        let err = load_plots_csv(file.path(), &GridConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Invalid zone on row 2"));
    }

    #[test]
    fn test_event_log() {
        let conn = open();

        let event = Event::new(
            "test_event",
            "plot",
            "1,1",
            serde_json::json!({"test": "data"}),
            "test_actor",
        );

        insert_event(&conn, &event).unwrap();

        let events = get_events_for_entity(&conn, "plot", "1,1").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "test_event");
        assert_eq!(events[0].actor, "test_actor");

        println!("✅ Event log test PASSED");
    }
}
