//! Scoped loading of third-party widget scripts (the scheduling embed on the
//! consultation page). A script is injected when the first component using it
//! mounts and removed when the last one unmounts.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use url::Url;

pub const SCHEDULING_WIDGET_SCRIPT: &str = "https://assets.calendly.com/assets/external/widget.js";
pub const SCHEDULING_URL: &str = "https://calendly.com/redbridgesolutions-co/30min?hide_event_type_details=1&hide_gdpr_banner=1&primary_color=46515a";

/// The document the scripts are attached to.
pub trait ScriptHost: Send + Sync {
    fn inject(&self, src: &str);
    fn remove(&self, src: &str);
}

pub struct ScriptLoader<H: ScriptHost> {
    host: H,
    mounts: Mutex<HashMap<String, usize>>,
}

impl<H: ScriptHost> ScriptLoader<H> {
    pub fn new(host: H) -> Arc<Self> {
        Arc::new(Self {
            host,
            mounts: Mutex::new(HashMap::new()),
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Injection happens under the mount lock, so concurrent first mounts
    /// cannot both inject.
    pub fn mount(self: &Arc<Self>, src: &str) -> ScriptMount<H> {
        let mut mounts = self.mounts.lock().unwrap_or_else(PoisonError::into_inner);
        let count = mounts.entry(src.to_string()).or_insert(0);
        if *count == 0 {
            self.host.inject(src);
        }
        *count += 1;
        ScriptMount {
            loader: Arc::clone(self),
            src: src.to_string(),
        }
    }

    pub fn active_mounts(&self, src: &str) -> usize {
        self.mounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(src)
            .copied()
            .unwrap_or(0)
    }

    fn release(&self, src: &str) {
        let mut mounts = self.mounts.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(count) = mounts.get_mut(src) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            mounts.remove(src);
            self.host.remove(src);
        }
    }
}

/// Keeps a script attached while alive.
pub struct ScriptMount<H: ScriptHost> {
    loader: Arc<ScriptLoader<H>>,
    src: String,
}

impl<H: ScriptHost> ScriptMount<H> {
    pub fn src(&self) -> &str {
        &self.src
    }
}

impl<H: ScriptHost> Drop for ScriptMount<H> {
    fn drop(&mut self) {
        self.loader.release(&self.src);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingEmbed {
    booking_url: Url,
    script_src: String,
}

impl SchedulingEmbed {
    pub fn new(booking_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            booking_url: Url::parse(booking_url)?,
            script_src: SCHEDULING_WIDGET_SCRIPT.to_string(),
        })
    }

    pub fn booking_url(&self) -> &str {
        self.booking_url.as_str()
    }

    pub fn mount<H: ScriptHost>(&self, loader: &Arc<ScriptLoader<H>>) -> ScriptMount<H> {
        loader.mount(&self.script_src)
    }
}

#[cfg(test)]
#[path = "tests/embed_tests.rs"]
mod tests;
