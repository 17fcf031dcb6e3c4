mod manifest;

pub use manifest::{
    API_VERSION, Config, DEFAULT_ARCH, Metadata, OsMetadata, UpdateManifest, UpdatePackage,
};
