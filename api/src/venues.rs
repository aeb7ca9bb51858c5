//! Campus venues selectable when creating a session. A session can also
//! carry a free-text location instead of one of these keys.

pub const VENUES: &[(&str, &str)] = &[
    ("im_fields", "IM Fields"),
    ("im_basketball", "IM Basketball Courts"),
    ("im_racquetball", "IM Racquetball Courts"),
    ("im_soccer", "RWC Park"),
    ("rcc_volleyball", "RWC Volleyball Courts"),
    ("lake_claire", "Lake Claire"),
    ("memory_mall", "Memory Mall"),
    ("arc_fitness", "RWC Fitness"),
];

pub fn venue_name(key: &str) -> Option<&'static str> {
    VENUES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| *name)
}
