//! Redis-backed counter stores for multi-instance deployments.
//!
//! Every mutation runs as a single command or Lua script, so concurrent
//! requests on different instances observe one authoritative count. Window
//! and lockout expiry are delegated to Redis key TTLs: Redis' own clock
//! decides when a key expires, while `now` fixes the reset instant a window
//! reports for its whole lifetime.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use tracing::info;

use vault_core::{Error, LoginAttemptRecord, LoginAttemptStore, RateCounterStore, RateWindow, Result};

const RATE_PREFIX: &str = "dv:rate:";
const LOGIN_FAIL_PREFIX: &str = "dv:login:fail:";
const LOGIN_LOCK_PREFIX: &str = "dv:login:lock:";
const LOCKED_INDEX: &str = "dv:login:locked";
const SUSPICIOUS_IPS: &str = "dv:login:suspicious_ips";

/// Counts a hit in a window hash. The first hit of a window pins its reset
/// instant (epoch millis) next to the count, so every later hit reports the
/// same `reset_at`. Returns `{count, reset_at}`.
static HIT_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        local c = redis.call('HINCRBY', KEYS[1], 'count', 1)
        if c == 1 then
            redis.call('HSET', KEYS[1], 'reset_at', ARGV[1])
            redis.call('PEXPIRE', KEYS[1], ARGV[2])
        end
        return {c, tonumber(redis.call('HGET', KEYS[1], 'reset_at'))}
        ",
    )
});

/// First-writer-wins lockout. Returns the lockout in effect (epoch millis).
static LOCK_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        local ok = redis.call('SET', KEYS[1], ARGV[1], 'NX', 'PXAT', ARGV[1])
        if ok then
            redis.call('PEXPIREAT', KEYS[2], ARGV[1])
            redis.call('ZADD', KEYS[3], ARGV[1], ARGV[2])
            return tonumber(ARGV[1])
        end
        return tonumber(redis.call('GET', KEYS[1]))
        ",
    )
});

fn cache_err(e: redis::RedisError) -> Error {
    Error::Cache(e.to_string())
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| Error::Cache(format!("invalid timestamp from redis: {}", ms)))
}

/// Open a managed Redis connection.
pub async fn connect(redis_url: &str) -> Result<ConnectionManager> {
    let client = redis::Client::open(redis_url).map_err(cache_err)?;
    let conn = ConnectionManager::new(client).await.map_err(cache_err)?;
    info!(
        subsystem = "db",
        component = "redis",
        url = %redis_url.replace(|c: char| c.is_ascii_alphanumeric(), "*"),
        "Redis connection established"
    );
    Ok(conn)
}

// =============================================================================
// RATE COUNTERS
// =============================================================================

#[derive(Clone)]
pub struct RedisRateCounterStore {
    conn: ConnectionManager,
}

impl RedisRateCounterStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RateCounterStore for RedisRateCounterStore {
    async fn hit(&self, key: &str, window: Duration, now: DateTime<Utc>) -> Result<RateWindow> {
        let mut conn = self.conn.clone();
        let window_ms = window.num_milliseconds().max(1);
        let (count, reset_ms): (i64, i64) = HIT_SCRIPT
            .key(format!("{RATE_PREFIX}{key}"))
            .arg((now + Duration::milliseconds(window_ms)).timestamp_millis())
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(cache_err)?;
        Ok(RateWindow {
            count: count.clamp(0, u32::MAX as i64) as u32,
            reset_at: from_millis(reset_ms)?,
        })
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<usize> {
        // Expired windows vanish through their TTL.
        Ok(0)
    }
}

// =============================================================================
// LOGIN ATTEMPTS
// =============================================================================

#[derive(Clone)]
pub struct RedisLoginAttemptStore {
    conn: ConnectionManager,
}

impl RedisLoginAttemptStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl LoginAttemptStore for RedisLoginAttemptStore {
    async fn get(&self, identifier: &str) -> Result<Option<LoginAttemptRecord>> {
        let mut conn = self.conn.clone();
        let (count, lock): (Option<u32>, Option<i64>) = redis::pipe()
            .get(format!("{LOGIN_FAIL_PREFIX}{identifier}"))
            .get(format!("{LOGIN_LOCK_PREFIX}{identifier}"))
            .query_async(&mut conn)
            .await
            .map_err(cache_err)?;
        if count.is_none() && lock.is_none() {
            return Ok(None);
        }
        Ok(Some(LoginAttemptRecord {
            identifier: identifier.to_string(),
            count: count.unwrap_or(0),
            lockout_until: lock.map(from_millis).transpose()?,
            last_failure_at: None,
        }))
    }

    async fn record_failure(
        &self,
        identifier: &str,
        _now: DateTime<Utc>,
        memory: Duration,
    ) -> Result<u32> {
        let key = format!("{LOGIN_FAIL_PREFIX}{identifier}");
        let mut conn = self.conn.clone();
        // The TTL slides with each failure; an idle count expires on its own.
        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(&key, 1)
            .pexpire(&key, memory.num_milliseconds().max(1))
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(cache_err)?;
        Ok(count.clamp(0, u32::MAX as i64) as u32)
    }

    async fn lock(&self, identifier: &str, until: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let mut conn = self.conn.clone();
        let effective: i64 = LOCK_SCRIPT
            .key(format!("{LOGIN_LOCK_PREFIX}{identifier}"))
            .key(format!("{LOGIN_FAIL_PREFIX}{identifier}"))
            .key(LOCKED_INDEX)
            .arg(until.timestamp_millis())
            .arg(identifier)
            .invoke_async(&mut conn)
            .await
            .map_err(cache_err)?;
        from_millis(effective)
    }

    async fn clear(&self, identifier: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .del(format!("{LOGIN_FAIL_PREFIX}{identifier}"))
            .ignore()
            .del(format!("{LOGIN_LOCK_PREFIX}{identifier}"))
            .ignore()
            .zrem(LOCKED_INDEX, identifier)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(cache_err)?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>, _memory: Duration) -> Result<usize> {
        // Failure counts expire through their TTL; only the index needs pruning.
        let mut conn = self.conn.clone();
        let removed: i64 = conn
            .zrembyscore(LOCKED_INDEX, "-inf", format!("({}", now.timestamp_millis()))
            .await
            .map_err(cache_err)?;
        Ok(removed.max(0) as usize)
    }

    async fn locked_count(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut conn = self.conn.clone();
        let count: i64 = conn
            .zcount(LOCKED_INDEX, now.timestamp_millis(), "+inf")
            .await
            .map_err(cache_err)?;
        Ok(count.max(0) as u64)
    }

    async fn flag_ip(&self, ip: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.sadd(SUSPICIOUS_IPS, ip).await.map_err(cache_err)?;
        Ok(())
    }

    async fn suspicious_ip_count(&self) -> Result<u64> {
        let mut conn = self.conn.clone();
        let count: i64 = conn.scard(SUSPICIOUS_IPS).await.map_err(cache_err)?;
        Ok(count.max(0) as u64)
    }
}
