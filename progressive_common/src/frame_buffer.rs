use log::info;
use crate::device::RenderDevice;
use crate::error::Result;
use crate::parameters::ViewportSize;

struct TargetPair<T> {
    raw: T,
    converged: Option<T>,
    size: ViewportSize,
}

// borrowed view of the current targets, valid until the next resize
pub struct RenderTargets<'a, T> {
    pub raw: &'a T,
    pub converged: Option<&'a T>,
    pub size: ViewportSize,
    // true when this call had to (re)create the targets
    pub reallocated: bool,
}

// Owns the raw kernel output and, optionally, the converged running average.
// Both are always the same size as the viewport; a size change recreates
// both together.
pub struct FrameBufferManager<T> {
    targets: Option<TargetPair<T>>,
    separate_converged: bool,
}

impl<T> FrameBufferManager<T> {
    pub fn new(separate_converged: bool) -> Self {
        Self { targets: None, separate_converged }
    }

    pub fn size(&self) -> Option<ViewportSize> {
        self.targets.as_ref().map(|pair| pair.size)
    }

    pub fn is_allocated(&self) -> bool {
        self.targets.is_some()
    }

    pub fn ensure<D>(&mut self, device: &mut D, size: ViewportSize) -> Result<RenderTargets<'_, T>>
    where D: RenderDevice<Texture = T> {
        let mut reallocated = false;
        let pair = match self.targets.take() {
            Some(pair) if pair.size == size => pair,
            stale => {
                if let Some(stale) = stale {
                    Self::release_pair(device, stale);
                }
                let pair = Self::allocate(device, size, self.separate_converged)?;
                info!("allocated {}x{} render targets{}", size.width, size.height,
                      if self.separate_converged { " (raw + converged)" } else { "" });
                reallocated = true;
                pair
            }
        };

        let pair = self.targets.insert(pair);
        Ok(RenderTargets {
            raw: &pair.raw,
            converged: pair.converged.as_ref(),
            size: pair.size,
            reallocated,
        })
    }

    fn allocate<D>(device: &mut D, size: ViewportSize, separate_converged: bool) -> Result<TargetPair<T>>
    where D: RenderDevice<Texture = T> {
        let raw = device.create_target("raw target", size)?;
        let converged = if separate_converged {
            match device.create_target("converged target", size) {
                Ok(converged) => Some(converged),
                Err(e) => {
                    // never bound to anything, safe to drop right away
                    device.release_target(raw);
                    return Err(e);
                }
            }
        } else {
            None
        };

        Ok(TargetPair { raw, converged, size })
    }

    pub fn release<D>(&mut self, device: &mut D)
    where D: RenderDevice<Texture = T> {
        if let Some(pair) = self.targets.take() {
            Self::release_pair(device, pair);
        }
    }

    fn release_pair<D>(device: &mut D, pair: TargetPair<T>)
    where D: RenderDevice<Texture = T> {
        device.wait_idle();
        device.release_target(pair.raw);
        if let Some(converged) = pair.converged {
            device.release_target(converged);
        }
    }
}
