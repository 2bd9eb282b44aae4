use redis::RedisResult;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Fixed-window counter. Returns `true` while `key` is within `limit`
    /// hits for the current window. The window starts at the first hit and
    /// later hits do not extend it.
    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: i64,
        window_seconds: i64,
    ) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = rate_limit_pipeline(key, window_seconds)
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

/// INCR the counter and set its TTL only if it has none yet (`EXPIRE ... NX`,
/// Redis 7+).
fn rate_limit_pipeline(key: &str, window_seconds: i64) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .incr(key, 1)
        .add_command(redis::cmd("EXPIRE").arg(key).arg(window_seconds).arg("NX").to_owned())
        .ignore();
    pipe
}

pub fn rate_limit_key(client_ip: &str) -> String {
    format!("busline:ratelimit:{}", client_ip)
}
