use std::sync::Mutex;

use chrono::Utc;
use rand::{thread_rng, Rng};

use crate::{settings_store::SettingsStore, Error, Result};

/// Settings key under which the visitor id is persisted.
pub const VISITOR_ID_KEY: &str = "enh_visitor_id";

/// Exclusive upper bound of the random component of a visitor id.
const RANDOM_BOUND: u32 = 999;

/// Generate a fresh visitor id.
///
/// The id is a random number in `0..999` followed by the current epoch-millisecond timestamp
/// offset by that same number, both rendered as decimal digits.
pub fn generate_visitor_id() -> String {
    let random = thread_rng().gen_range(0..RANDOM_BOUND);
    format_visitor_id(random, Utc::now().timestamp_millis())
}

fn format_visitor_id(random: u32, now_millis: i64) -> String {
    format!("{}{}", random, now_millis + i64::from(random))
}

/// `VisitorIdStore` owns the get-or-create sequence for the per-installation visitor id.
///
/// The whole sequence runs under one lock, so concurrent first use persists at most one id.
pub(crate) struct VisitorIdStore<'a> {
    settings: Box<dyn SettingsStore + 'a>,
    cached: Mutex<Option<String>>,
}

impl<'a> VisitorIdStore<'a> {
    pub fn new(settings: Box<dyn SettingsStore + 'a>) -> Self {
        VisitorIdStore {
            settings,
            cached: Mutex::new(None),
        }
    }

    /// Return the persisted visitor id, generating and committing one if absent.
    ///
    /// Every failure is reported as [`Error::Persistence`].
    pub fn get_or_create(&self) -> Result<String> {
        self.get_or_create_inner().map_err(|err| match err {
            Error::Persistence(_) => err,
            other => Error::persistence("settings store", other),
        })
    }

    fn get_or_create_inner(&self) -> Result<String> {
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| Error::Persistence("visitor id lock poisoned".to_owned()))?;
        if let Some(visitor_id) = &*cached {
            return Ok(visitor_id.clone());
        }

        let visitor_id = match self.settings.get(VISITOR_ID_KEY)? {
            Some(visitor_id) if !visitor_id.is_empty() => visitor_id,
            _ => self.create()?,
        };

        *cached = Some(visitor_id.clone());
        Ok(visitor_id)
    }

    fn create(&self) -> Result<String> {
        let visitor_id = generate_visitor_id();
        self.settings.put(VISITOR_ID_KEY, &visitor_id)?;
        self.settings.commit()?;

        // Read back so a commit that silently lost the value fails here instead of producing an
        // empty id on the next launch.
        match self.settings.get(VISITOR_ID_KEY)? {
            Some(stored) if stored == visitor_id => {
                log::debug!(target: "enhencer", visitor_id = visitor_id.as_str(); "generated new visitor id");
                Ok(visitor_id)
            }
            _ => Err(Error::Persistence(
                "visitor id was not persisted after commit".to_owned(),
            )),
        }
    }
}
