//! Registry capacity boundary.
//!
//! Lives in its own test binary: the registry is process-wide, and this
//! test deliberately fills it to the brim.

#![allow(dead_code)]

use colonnade::{
    register_component, registered_component_count, EcsError, RegistryError, MAX_COMPONENTS,
};

macro_rules! declare_fillers {
    ($($name:ident),+) => {
        $(
            #[derive(Clone, Copy)]
            struct $name(u8);
        )+
    };
}

declare_fillers!(
    C00, C01, C02, C03, C04, C05, C06, C07, C08, C09, C10, C11, C12, C13, C14, C15, C16, C17,
    C18, C19, C20, C21, C22, C23, C24, C25, C26, C27, C28, C29, C30, C31
);

struct Overflow(u8);

#[test]
fn filling_the_registry_succeeds_and_one_more_fails() {
    let mut ids = Vec::new();
    macro_rules! register_fillers {
        ($($name:ident),+) => {
            $(ids.push(register_component::<$name>().unwrap());)+
        };
    }
    register_fillers!(
        C00, C01, C02, C03, C04, C05, C06, C07, C08, C09, C10, C11, C12, C13, C14, C15, C16,
        C17, C18, C19, C20, C21, C22, C23, C24, C25, C26, C27, C28, C29, C30, C31
    );

    assert_eq!(ids.len(), MAX_COMPONENTS);
    assert_eq!(registered_component_count().unwrap(), MAX_COMPONENTS);
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), MAX_COMPONENTS, "ids must be dense and unique");

    let err = register_component::<Overflow>().unwrap_err();
    assert_eq!(
        err,
        EcsError::Registry(RegistryError::CapacityExceeded { cap: MAX_COMPONENTS })
    );

    // Existing registrations keep resolving after the failure.
    assert_eq!(register_component::<C00>().unwrap(), ids[0]);
}
