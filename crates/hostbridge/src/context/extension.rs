use std::{any::Any, fmt};

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use crate::error::{Error, Result};

/// Kind of platform-specific state a context can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Facade over the host's resource and service access.
    ResourceFacade,
    /// Per-context record for the attached foreign environment.
    EnvironmentAttachment,
}

impl SlotKind {
    pub const ALL: [Self; 2] = [Self::ResourceFacade, Self::EnvironmentAttachment];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResourceFacade => "resource-facade",
            Self::EnvironmentAttachment => "environment-attachment",
        }
    }

    /// Whether the platform capability behind this slot is compiled in.
    pub const fn is_available(self) -> bool {
        match self {
            Self::ResourceFacade => true,
            Self::EnvironmentAttachment => cfg!(feature = "environment-attachment"),
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native state that can occupy an extension slot.
pub trait PlatformExtension: Any + Send {
    const SLOT: SlotKind;
}

type Occupant = Box<dyn Any + Send>;

/// One exclusively owned occupant per [`SlotKind`].
///
/// Each slot has its own lock, so borrowing one occupant leaves the other
/// slots usable.
#[derive(Default)]
pub(crate) struct ExtensionSlots {
    slots: [Mutex<Option<Occupant>>; SlotKind::ALL.len()],
}

impl ExtensionSlots {
    pub(crate) fn check_available(kind: SlotKind) -> Result<()> {
        if kind.is_available() {
            Ok(())
        } else {
            Err(Error::SlotUnavailable(kind))
        }
    }

    const fn slot(&self, kind: SlotKind) -> &Mutex<Option<Occupant>> {
        &self.slots[kind.index()]
    }

    pub(crate) fn take(&self, kind: SlotKind) -> Option<Occupant> {
        self.slot(kind).lock().take()
    }

    /// Installs `value` into an empty slot. Callers drop the previous
    /// occupant first via [`Self::take`].
    pub(crate) fn install(&self, kind: SlotKind, value: Occupant) {
        let mut slot = self.slot(kind).lock();
        debug_assert!(slot.is_none());
        *slot = Some(value);
    }

    pub(crate) fn is_occupied(&self, kind: SlotKind) -> bool {
        self.slot(kind).lock().is_some()
    }

    /// Locks `E`'s slot and borrows its occupant.
    pub(crate) fn get<E: PlatformExtension>(&self) -> Option<MappedMutexGuard<'_, E>> {
        MutexGuard::try_map(self.slot(E::SLOT).lock(), |slot| {
            slot.as_mut().and_then(|occupant| occupant.downcast_mut::<E>())
        })
        .ok()
    }

    /// Removes the occupant of `E`'s slot if it is an `E`.
    pub(crate) fn take_as<E: PlatformExtension>(&self) -> Option<E> {
        let mut slot = self.slot(E::SLOT).lock();
        if !slot.as_ref().is_some_and(|occupant| occupant.is::<E>()) {
            return None;
        }
        slot.take()
            .and_then(|occupant| occupant.downcast::<E>().ok())
            .map(|occupant| *occupant)
    }

    pub(crate) fn clear(&mut self) {
        for slot in &mut self.slots {
            drop(slot.get_mut().take());
        }
    }
}

impl fmt::Debug for ExtensionSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in SlotKind::ALL {
            let state = match self.slot(kind).try_lock() {
                Some(slot) if slot.is_some() => "occupied",
                Some(_) => "empty",
                None => "borrowed",
            };
            map.entry(&kind.as_str(), &state);
        }
        map.finish()
    }
}
