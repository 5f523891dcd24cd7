mod inspect;

pub use inspect::InspectService;
