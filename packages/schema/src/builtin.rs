//! Built-in component catalog.

use crate::kind::PropKind;
use crate::registry::SchemaRegistry;
use crate::schema::{AssetKind, PropSpec, Schema, ZoneSpec};

fn style() -> PropSpec {
    PropSpec::new(PropKind::Style)
}

fn label() -> PropSpec {
    PropSpec::new(PropKind::Text)
}

/// The standard page-building components.
///
/// `Section.body` only accepts `Heading` and `Text`; `Columns` zones take
/// anything except another `Section`.
pub fn standard_registry() -> SchemaRegistry {
    let build = || {
        SchemaRegistry::builder()
            .root(ZoneSpec::only(["Section", "Container", "Columns", "Spacer"]))
            .component(
                "Section",
                Schema::new("section")
                    .prop("label", label())
                    .prop("style", style())
                    .prop("anchor", PropSpec::new(PropKind::Text).with_attribute("id"))
                    .zone("body", ZoneSpec::only(["Heading", "Text"])),
            )?
            .component(
                "Container",
                Schema::new("div")
                    .prop("label", label())
                    .prop("style", style())
                    .zone("content", ZoneSpec::any()),
            )?
            .component(
                "Columns",
                Schema::new("div")
                    .prop("label", label())
                    .prop("style", style())
                    .zone("left", ZoneSpec::any_except(["Section"]))
                    .zone("right", ZoneSpec::any_except(["Section"])),
            )?
            .component(
                "Heading",
                Schema::new("h2")
                    .prop("label", label())
                    .prop("text", PropSpec::new(PropKind::Text).with_default("Heading"))
                    .prop("style", style())
                    .text("text"),
            )?
            .component(
                "Text",
                Schema::new("p")
                    .prop("label", label())
                    .prop("text", PropSpec::new(PropKind::Text).with_default(""))
                    .prop("color", PropSpec::new(PropKind::Color))
                    .prop("style", style())
                    .text("text"),
            )?
            .component(
                "Button",
                Schema::new("a")
                    .prop("label", label())
                    .prop("text", PropSpec::new(PropKind::Text).with_default("Click me"))
                    .prop("href", PropSpec::new(PropKind::Url).with_attribute("href"))
                    .prop(
                        "variant",
                        PropSpec::new(PropKind::Enum(vec![
                            "primary".into(),
                            "secondary".into(),
                            "ghost".into(),
                        ]))
                        .with_default("primary"),
                    )
                    .prop("style", style())
                    .text("text"),
            )?
            .component(
                "Image",
                Schema::new("img")
                    .prop("label", label())
                    .prop(
                        "src",
                        PropSpec::new(PropKind::Url)
                            .with_attribute("src")
                            .with_asset(AssetKind::Image),
                    )
                    .prop("alt", PropSpec::new(PropKind::Text).with_attribute("alt"))
                    .prop("style", style()),
            )?
            .component(
                "Link",
                Schema::new("a")
                    .prop("label", label())
                    .prop("text", PropSpec::new(PropKind::Text).with_default("Link"))
                    .prop("href", PropSpec::new(PropKind::Url).with_attribute("href"))
                    .prop("style", style())
                    .text("text"),
            )?
            .component(
                "Spacer",
                Schema::new("div")
                    .prop("label", label())
                    .prop("height", PropSpec::new(PropKind::Number).with_default(32))
                    .prop("style", style()),
            )?
            .build()
    };

    // The catalog is static data; failing to build it is a programming error.
    match build() {
        Ok(registry) => registry,
        Err(e) => unreachable!("standard registry is invalid: {}", e),
    }
}
