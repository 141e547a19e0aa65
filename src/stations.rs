use std::{collections::HashMap, time::Duration};

/// Where a station whose audio is served as numbered segments gets its data.
/// `index_path` points at the playlist carrying the current sequence number,
/// `segment_prefix` + sequence + ".aac" is a single segment.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentedSource {
    pub base_url: String,
    pub index_path: String,
    pub segment_prefix: String,
    pub poll_interval: Duration,
    pub prefetch: u32,
}

impl SegmentedSource {
    pub fn index_url(&self) -> String {
        self.base_url.clone() + &self.index_path
    }

    pub fn segment_url(&self, seq: u64) -> String {
        self.base_url.clone() + &self.segment_prefix + &seq.to_string() + ".aac"
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StationSource {
    Direct { url: String },
    Segmented(SegmentedSource),
}

#[derive(Clone, Debug, PartialEq)]
pub struct StationDescriptor {
    pub name: String,
    pub thumbnail: String,
    pub source: StationSource,
}

/// Hardcoded station pool. Lookup is case-insensitive, listing preserves
/// insertion order so the station menus stay stable across renders.
pub struct StationCatalog {
    stations: Vec<StationDescriptor>,
    by_name: HashMap<String, usize>,
}

impl StationCatalog {
    fn insert(&mut self, name: &str, thumbnail: &str, source: StationSource) {
        self.by_name.insert(name.to_lowercase(), self.stations.len());
        self.stations.push(StationDescriptor {
            name: name.to_owned(),
            thumbnail: thumbnail.to_owned(),
            source,
        });
    }

    fn insert_stream(&mut self, name: &str, thumbnail: &str, url: &str) {
        self.insert(name, thumbnail, StationSource::Direct { url: url.to_owned() });
    }

    pub fn resolve(&self, name: &str) -> Option<&StationDescriptor> {
        self.by_name.get(&name.to_lowercase())
            .map(|i| &self.stations[*i])
    }

    pub fn all(&self) -> &[StationDescriptor] {
        &self.stations
    }
}

impl Default for StationCatalog {
    fn default() -> Self {
        let mut pool = Self { stations: Vec::new(), by_name: HashMap::new() };

        pool.insert("RDS", "https://www.rds.it/img/logo-rds.png", StationSource::Segmented(SegmentedSource {
            base_url: "https://streamcdnm23-dd782ed59e2a4e86aabf6fc508674b59.msvdn.net/live/S3160845/0tuSetc8UFkF/".to_owned(),
            index_path: "chunklist_b128000.m3u8".to_owned(),
            segment_prefix: "media-u1nu3maeq_b128000_".to_owned(),
            poll_interval: Duration::from_millis(3000),
            prefetch: 3,
        }));
        pool.insert("RadioItalia", "https://www.radioitalia.it/images/logo_radio_italia.png", StationSource::Segmented(SegmentedSource {
            base_url: "https://radioitaliasmr.akamaized.net/hls/live/2093120/RISMR/".to_owned(),
            index_path: "chunklist.m3u8".to_owned(),
            segment_prefix: "media_".to_owned(),
            poll_interval: Duration::from_millis(4000),
            prefetch: 2,
        }));

        pool.insert_stream("TRX", "https://www.dailyonline.it/application/files/6715/7583/8347/TRX_Radio.png", "https://trx.fluidstream.eu/trx.mp3");

        pool.insert_stream("Virgin", "https://www.virginradio.it/resizer/-1/-1/true/Webradio-Virgin-2020-VirginRadioOnAir-1588257500754.png--.png", "https://icy.unitedradio.it/Virgin.mp3");
        pool.insert_stream("ClassicRock", "https://www.virginradio.it/resizer/-1/-1/true/Webradio-Virgin-2020-ClassicRock-1588062884404.png--.png", "https://icy.unitedradio.it/VirginRockClassics.mp3");
        pool.insert_stream("RockHits", "https://www.virginradio.it/resizer/-1/-1/true/Webradio-Virgin-2020-RockHits-1588062672845.png--.png", "https://icy.unitedradio.it/VirginRockHits.mp3");
        pool.insert_stream("RockBallads", "https://www.virginradio.it/resizer/-1/-1/true/Webradio-Virgin-2020-RockBallads-1588062347185.png--.png", "https://icy.unitedradio.it/Virgin_06.mp3");
        pool.insert_stream("Virgin70s", "https://www.virginradio.it/resizer/-1/-1/true/Webradio-Virgin-2020-Rock70-1588062930899.png--.png", "https://icy.unitedradio.it/VirginRock70.mp3");
        pool.insert_stream("Virgin80s", "https://www.virginradio.it/resizer/-1/-1/true/Webradio-Virgin-2020-Rock80-1588062718835.png--.png", "https://icy.unitedradio.it/VirginRock80.mp3");

        pool.insert_stream("Doomed", "https://somafm.com/img3/specials-400.jpg", "http://ice4.somafm.com/specials-128-mp3");
        pool.insert_stream("Dronezone", "https://somafm.com/img3/dronezone-400.jpg", "http://ice4.somafm.com/dronezone-128-mp3");
        pool.insert_stream("Deepspaceone", "https://somafm.com/img3/deepspaceone-400.jpg", "http://ice4.somafm.com/deepspaceone-128-mp3");
        pool.insert_stream("Spacestation", "https://somafm.com/img3/spacestation-400.jpg", "http://ice4.somafm.com/spacestation-128-mp3");
        pool.insert_stream("Vaporwaves", "https://somafm.com/img3/vaporwaves-400.jpg", "http://ice4.somafm.com/vaporwaves-128-mp3");
        pool.insert_stream("Defcon", "https://somafm.com/img3/defcon-400.jpg", "http://ice4.somafm.com/defcon-128-mp3");
        pool.insert_stream("Lush", "https://somafm.com/img3/lush-400.jpg", "http://ice4.somafm.com/lush-128-mp3");
        pool.insert_stream("Fluid", "https://somafm.com/img3/fluid-400.jpg", "http://ice4.somafm.com/fluid-128-mp3");
        pool.insert_stream("Poptron", "https://somafm.com/img3/poptron-400.jpg", "http://ice4.somafm.com/poptron-128-mp3");
        pool.insert_stream("Suburbsofgoa", "https://somafm.com/img3/suburbsofgoa-400.jpg", "http://ice4.somafm.com/suburbsofgoa-128-mp3");
        pool.insert_stream("Groovesalad", "https://somafm.com/img3/groovesalad-400.jpg", "http://ice4.somafm.com/groovesalad-128-mp3");
        pool.insert_stream("N5md", "https://somafm.com/img3/n5md-400.png", "http://ice4.somafm.com/n5md-128-mp3");
        pool.insert_stream("Beatblender", "https://somafm.com/img3/beatblender-400.jpg", "http://ice4.somafm.com/beatblender-128-mp3");
        pool.insert_stream("Bootliquor", "https://somafm.com/img3/bootliquor-400.jpg", "http://ice4.somafm.com/bootliquor-128-mp3");
        pool.insert_stream("Illstreet", "https://somafm.com/img3/illstreet-400.jpg", "http://ice4.somafm.com/illstreet-128-mp3");
        pool.insert_stream("Thistle", "https://somafm.com/img3/thistle-400.jpg", "http://ice4.somafm.com/thistle-128-mp3");
        pool.insert_stream("Covers", "https://somafm.com/img3/covers-400.jpg", "http://ice4.somafm.com/covers-128-mp3");
        pool.insert_stream("Dubstep", "https://somafm.com/img3/dubstep-400.jpg", "http://ice4.somafm.com/dubstep-128-mp3");
        pool.insert_stream("7soul", "https://somafm.com/img3/7soul-400.jpg", "http://ice4.somafm.com/7soul-128-mp3");
        pool.insert_stream("Seventies", "https://somafm.com/img3/seventies400.jpg", "http://ice4.somafm.com/seventies-128-mp3");
        pool.insert_stream("U80s", "https://somafm.com/img3/u80s-400.png", "http://ice4.somafm.com/u80s-128-mp3");
        pool.insert_stream("Secretagent", "https://somafm.com/img3/secretagent-400.jpg", "http://ice4.somafm.com/secretagent-128-mp3");
        pool.insert_stream("Thetrip", "https://somafm.com/img3/thetrip-400.jpg", "http://ice4.somafm.com/thetrip-128-mp3");
        pool.insert_stream("Sonicuniverse", "https://somafm.com/img3/sonicuniverse-400.jpg", "http://ice4.somafm.com/sonicuniverse-128-mp3");
        pool.insert_stream("Indiepop", "https://somafm.com/img3/indiepop-400.jpg", "http://ice4.somafm.com/indiepop-128-mp3");
        pool.insert_stream("Digitalis", "https://somafm.com/img3/digitalis-400.jpg", "http://ice4.somafm.com/digitalis-128-mp3");
        pool.insert_stream("Folkfwd", "https://somafm.com/img3/folkfwd-400.jpg", "http://ice4.somafm.com/folkfwd-128-mp3");
        pool.insert_stream("Brfm", "https://somafm.com/img3/brfm-400.jpg", "http://ice4.somafm.com/brfm-128-mp3");
        pool.insert_stream("Missioncontrol", "https://somafm.com/img3/missioncontrol-400.jpg", "http://ice4.somafm.com/missioncontrol-128-mp3");
        pool.insert_stream("Sf1033", "https://somafm.com/img3/sf1033-400.jpg", "http://ice4.somafm.com/sf1033-128-mp3");
        pool.insert_stream("Scanner", "https://somafm.com/img3/scanner-400.jpg", "http://ice4.somafm.com/scanner-128-mp3");
        pool.insert_stream("Bagel", "https://somafm.com/img3/bagel-400.jpg", "http://ice4.somafm.com/bagel-128-mp3");
        pool.insert_stream("Live", "https://somafm.com/img3/live-400.jpg", "http://ice4.somafm.com/live-128-mp3");

        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_case_insensitive() {
        let pool = StationCatalog::default();
        let station = pool.resolve("tRx").unwrap();
        assert_eq!(station.name, "TRX");
        assert_eq!(pool.resolve("TRX").unwrap(), station);
    }

    #[test]
    fn resolve_unknown_is_none() {
        let pool = StationCatalog::default();
        assert!(pool.resolve("definitely-not-a-station").is_none());
    }

    #[test]
    fn listing_keeps_insertion_order() {
        let pool = StationCatalog::default();
        let names: Vec<&str> = pool.all().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names[0], "RDS");
        assert_eq!(names[2], "TRX");
        assert_eq!(*names.last().unwrap(), "Live");
        // every listed station resolves back to itself
        for station in pool.all() {
            assert_eq!(pool.resolve(&station.name).unwrap().name, station.name);
        }
    }

    #[test]
    fn segmented_urls_are_built_from_parts() {
        let source = SegmentedSource {
            base_url: "https://cdn.example/live/".to_owned(),
            index_path: "chunklist.m3u8".to_owned(),
            segment_prefix: "media_".to_owned(),
            poll_interval: Duration::from_millis(3000),
            prefetch: 2,
        };
        assert_eq!(source.index_url(), "https://cdn.example/live/chunklist.m3u8");
        assert_eq!(source.segment_url(118118216), "https://cdn.example/live/media_118118216.aac");
    }
}
