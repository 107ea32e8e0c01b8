use crate::{Context, Error, Result, truncate_long};
use std::{any, collections::BTreeMap, str::FromStr};
use url::Url;

/// Settings of a session, read from its connection url.
///
/// `driver://[user[:password]@][host][:port][/path]?[key=value&...]`
///
/// The scheme must be the driver name. `rewindable_result` (`true`/`false`,
/// `1`/`0`) sets the session default, every other query parameter is left to
/// the driver.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    url: Url,
    rewindable_result: bool,
    params: BTreeMap<String, String>,
}

impl ConnectOptions {
    pub fn parse(url: &str, scheme: &str) -> Result<Self> {
        let context = || format!("While parsing the connection url `{}`", truncate_long(url));
        let parsed = Url::parse(url).with_context(context)?;
        if parsed.scheme() != scheme {
            let error = Error::msg(format!(
                "Expected a `{scheme}://` connection url, found `{}://`",
                parsed.scheme()
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let mut params = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect::<BTreeMap<_, _>>();
        let rewindable_result = match params.remove("rewindable_result") {
            Some(v) => parse_flag(&v).with_context(context)?,
            None => false,
        };
        Ok(Self {
            url: parsed,
            rewindable_result,
            params,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Host followed by path, without leading slashes: `mock://orders` gives `orders`.
    pub fn name(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        let path = self.url.path().trim_start_matches('/');
        match (host.is_empty(), path.is_empty()) {
            (true, _) => path.to_owned(),
            (false, true) => host.to_owned(),
            (false, false) => format!("{host}/{path}"),
        }
    }

    pub fn rewindable_result(&self) -> bool {
        self.rewindable_result
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Parameter `key` parsed as `T`, `None` when it is absent.
    pub fn param_as<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.param(key)
            .map(|v| {
                v.parse::<T>().with_context(|| {
                    format!(
                        "Connection parameter `{key}={v}` is not a valid {}",
                        any::type_name::<T>()
                    )
                })
            })
            .transpose()
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value {
        x if x.eq_ignore_ascii_case("true") || x == "1" => Ok(true),
        x if x.eq_ignore_ascii_case("false") || x == "0" => Ok(false),
        _ => Err(Error::msg(format!(
            "Cannot parse `{value}` as a boolean flag"
        ))),
    }
}
