//! Builds a small KML document, validates it and prints both the XML and
//! the construction script that rebuilds it.
//!
//! Run with `cargo run --example placemark`.

use kml_factory::{
    print_to_string_pretty, write_construction_script, KmlFactory, NamespaceRegistry, Schema,
    Validator,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = NamespaceRegistry::kml();
    let KmlFactory { kml, atom, gx } = KmlFactory::new(&registry)?;

    let doc = kml
        .tag("kml")
        .child(
            kml.tag("Document")
                .child(kml.tag("name").text("CN Tower"))
                .child(atom.tag("link").attr("href", "https://www.cntower.ca"))
                .child(
                    kml.tag("Placemark")
                        .child(kml.tag("name").text("Observation deck"))
                        .child(kml.tag("description").text("<b>553.3 m</b> tall"))
                        .child(
                            kml.tag("Point")
                                .child(kml.tag("coordinates").text("-79.387,43.643,0")),
                        ),
                )
                .child(
                    gx.tag("Tour").child(
                        gx.tag("Playlist")
                            .child(gx.tag("Wait").child(gx.tag("duration").text(2.5))),
                    ),
                ),
        )
        .build()?;

    let schema = Schema::open("kml22gx.xsd")?;
    for issue in schema.validate_report(&doc).issues() {
        eprintln!("{}", issue);
    }

    print!("{}", print_to_string_pretty(&doc, &registry)?);
    println!();
    print!("{}", write_construction_script(&doc, &registry));
    Ok(())
}
