//! Scoped frame switching.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::driver::Driver;
use crate::page::{BasePage, ElementState};
use crate::{Error, Locator, Result};

/// Leaves the frame on drop unless disarmed. Covers a `switch_frame`
/// future that is dropped mid-body, e.g. by `tokio::time::timeout`.
struct FrameGuard<D: Driver> {
    driver: Option<D>,
    locator: String,
}

impl<D: Driver> FrameGuard<D> {
    fn new(driver: D, locator: &Locator) -> Self {
        Self {
            driver: Some(driver),
            locator: locator.to_string(),
        }
    }

    fn disarm(&mut self) {
        self.driver = None;
    }
}

impl<D: Driver> Drop for FrameGuard<D> {
    fn drop(&mut self) {
        let Some(driver) = self.driver.take() else {
            return;
        };
        let locator = std::mem::take(&mut self.locator);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!(%locator, "frame scope dropped, leaving frame");
                runtime.spawn(async move {
                    if let Err(e) = driver.switch_to_parent_frame().await {
                        warn!(%locator, error = %e, "could not leave frame after drop");
                    }
                });
            }
            Err(_) => warn!(%locator, "frame scope dropped outside a runtime, still in frame"),
        }
    }
}

impl<D: Driver> BasePage<D> {
    /// Run `body` inside the frame at `locator`, then return to the parent
    /// frame no matter how `body` ends.
    ///
    /// A panic in `body` is resumed after the switch back. When both `body`
    /// and the switch back fail, `body`'s error is returned.
    ///
    /// ```rust,no_run
    /// # use pagebase::{BasePage, Locator, Driver};
    /// # async fn demo<D: Driver>(page: &BasePage<D>) -> pagebase::Result<()> {
    /// let total = page
    ///     .switch_frame(&Locator::css("iframe#checkout"), |frame| async move {
    ///         frame.get_element(&Locator::id("card")).await?.send_keys("4242").await?;
    ///         frame.get_element(&Locator::id("total")).await?.text().await
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn switch_frame<T, F, Fut>(&self, locator: &Locator, body: F) -> Result<T>
    where
        F: FnOnce(BasePage<D>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let frame = self
            .wait_for_element(locator, ElementState::Presence, self.settings().element_timeout())
            .await?
            .ok_or_else(|| Error::NotFound(locator.to_string()))?;

        self.driver().switch_to_frame(frame.raw()).await?;
        debug!(%locator, "entered frame");
        let mut guard = FrameGuard::new(self.driver().clone(), locator);

        let outcome = AssertUnwindSafe(body(self.clone())).catch_unwind().await;
        guard.disarm();
        let revert = self.driver().switch_to_parent_frame().await;
        debug!(%locator, "left frame");

        match outcome {
            Err(panic) => {
                if let Err(e) = revert {
                    warn!(%locator, error = %e, "could not leave frame after panic");
                }
                std::panic::resume_unwind(panic)
            }
            Ok(Err(e)) => {
                if let Err(revert_err) = revert {
                    warn!(%locator, error = %revert_err, "could not leave frame");
                }
                Err(e)
            }
            Ok(Ok(value)) => revert.map(|_| value),
        }
    }
}
