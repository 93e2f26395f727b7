//! Asset kind definitions.

use std::fmt;
use std::path::Path;

/// Class of source asset, determines which pipeline handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    /// Markup (.html) - include expansion
    Html,
    /// Stylesheets (.scss/.css) - compile, prefix, strip comments
    Style,
    /// Scripts (.js) - bundle, downlevel, minify
    Script,
    /// Images - pass-through copy
    Image,
    /// Fonts - pass-through copy
    Font,
    /// Vendor libraries - pass-through copy
    Lib,
}

impl AssetKind {
    /// Every kind, in build order.
    pub const ALL: [Self; 6] = [
        Self::Html,
        Self::Style,
        Self::Script,
        Self::Image,
        Self::Font,
        Self::Lib,
    ];

    /// Short name used for task names, log prefixes and config keys.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Style => "styles",
            Self::Script => "scripts",
            Self::Image => "images",
            Self::Font => "fonts",
            Self::Lib => "lib",
        }
    }

    /// Whether a file under this kind's source dir can trigger a rebuild.
    ///
    /// Style partials and script modules count: they are pulled in by entries.
    pub fn watches(self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        match self {
            Self::Html => matches!(ext, "html" | "htm"),
            Self::Style => matches!(ext, "scss" | "sass" | "css"),
            Self::Script => matches!(ext, "js" | "mjs"),
            Self::Image | Self::Font | Self::Lib => true,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
