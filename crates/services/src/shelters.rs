//! # Shelter directory
//!
//! A static directory of partner shelter sites. Read-only reference data
//! with region filtering and keyword search; search terms go through the
//! same no-sale keyword screen as listing text.

use once_cell::sync::Lazy;

use domains::{DomainError, ShelterSite};

use crate::validation::KeywordScreen;

static SITES: Lazy<Vec<ShelterSite>> = Lazy::new(|| {
    let raw: &[(&str, &str, &str, &str, &str, &str, &str, &str)] = &[
        (
            "台北市動物之家",
            "台北市內湖區潭美街852號",
            "02-8791-3254",
            "",
            "https://www.tcapo.gov.taipei/Content_List.aspx?n=8A474D4AA59E06B7",
            "https://maps.app.goo.gl/EwqHF4cjCX1tE8pr6",
            "台北市最大的動物收容所,提供收容、認養、醫療等服務。歡迎民眾前來認養毛孩,給牠們一個溫暖的家。",
            "台北市",
        ),
        (
            "新北市板橋動物之家",
            "新北市板橋區板城路28-1號",
            "02-8966-2158",
            "",
            "https://www.facebook.com/NTPCBanqiao/",
            "https://maps.app.goo.gl/UYr6LWwZQJdKKsBH7",
            "新北市板橋區動物收容所,提供動物收容、認養服務。",
            "新北市",
        ),
        (
            "新北市中和動物之家",
            "新北市中和區興南路三段100號",
            "02-8668-5547",
            "",
            "https://www.facebook.com/profile.php?id=100066526002210",
            "https://maps.app.goo.gl/sYhxUFRVjESW5tN9A",
            "新北市中和動物之家,開放時間:週二至週日 上午10點~12點 下午2點~4點",
            "新北市",
        ),
        (
            "貓咪第一中途之家",
            "桃園市桃園區龍安街28號",
            "",
            "catfirst.ty@gmail.com",
            "https://www.facebook.com/catfirst.tw/",
            "https://maps.app.goo.gl/MPZrzbs51DfN1Fo1A",
            "主要協助桃園地區的貓咪中途。協助需要中途的貓咪、需要送養的貓咪、緊急醫療。",
            "桃園市",
        ),
        (
            "新竹市動物保護教育園區",
            "新竹市南寮里海濱路192號",
            "03-551-9548",
            "",
            "https://www.facebook.com/profile.php?id=100066627786621",
            "https://maps.app.goo.gl/STcdBCgGXjpussoR8",
            "與新竹市動物保護協會合作,提供動物收容、認養服務。",
            "新竹市",
        ),
        (
            "台中市動物之家",
            "台中市南屯區中台路601號",
            "04-2385-0976",
            "",
            "https://www.animal.taichung.gov.tw/1521449/Normalnodelist",
            "https://maps.app.goo.gl/XgcLGJoYw4pYByxM7",
            "以認養代替購買,讓愛不再流浪。",
            "台中市",
        ),
        (
            "彰化縣流浪狗中途之家",
            "彰化縣和美鎮東萊路426號",
            "04-859-0638",
            "",
            "https://www.facebook.com/DogcatFan",
            "https://maps.app.goo.gl/r1fEC5v4pV2NXqyAA",
            "協助救援流浪貓狗、協助送養、協助緊急醫療。",
            "彰化縣",
        ),
        (
            "嘉義市動物保護教育園區",
            "嘉義市彌陀路31號",
            "05-216-8661",
            "",
            "https://ccap.chiayi.gov.tw/",
            "https://maps.app.goo.gl/2nNwoPb8jL58oGQD7",
            "提供動物收容、認養服務,歡迎民眾前來認養。",
            "嘉義市",
        ),
        (
            "台南市動物之家",
            "台南市南區萬年路一段1~19號",
            "06-583-2399",
            "",
            "https://ahipo.tainan.gov.tw/",
            "https://maps.app.goo.gl/ZCE9zAD3dotfXV8q8",
            "提供動物收容、認養、醫療等服務。",
            "台南市",
        ),
        (
            "高雄市動物保護處",
            "高雄市鳳山區鳳頂路98號",
            "07-605-1002",
            "",
            "https://livestock.kcg.gov.tw/",
            "https://maps.app.goo.gl/ohGaACbCKsSX8he67",
            "提供動物收容、認養、醫療等服務。",
            "高雄市",
        ),
        (
            "宜蘭縣流浪動物中途之家",
            "宜蘭縣五結鄉成興村利寶路60號",
            "03-960-2350",
            "",
            "",
            "https://maps.app.goo.gl/817gw15Rg72QA4W46",
            "週一至週日開放(週三休館),開放時間10:00-16:00。",
            "宜蘭縣",
        ),
    ];

    raw.iter()
        .enumerate()
        .map(
            |(i, (name, address, phone, email, website, map, description, region))| ShelterSite {
                id: format!("site_{}", i + 1),
                name: name.to_string(),
                address: address.to_string(),
                phone: phone.to_string(),
                email: email.to_string(),
                website_url: website.to_string(),
                map_url: map.to_string(),
                description: description.to_string(),
                region: region.to_string(),
            },
        )
        .collect()
});

#[derive(Clone)]
pub struct ShelterDirectory {
    screen: KeywordScreen,
}

impl ShelterDirectory {
    pub fn new(screen: KeywordScreen) -> Self {
        Self { screen }
    }

    pub fn all(&self) -> Vec<ShelterSite> {
        SITES.clone()
    }

    /// Keyword and region search over the directory. The region matches as
    /// a substring of the site's region or address; the keyword searches
    /// name, address, description, and phone, and is rejected outright if
    /// it carries a commerce term.
    pub fn search(
        &self,
        keyword: &str,
        region: Option<&str>,
    ) -> Result<Vec<ShelterSite>, DomainError> {
        let keyword = keyword.trim();
        if !keyword.is_empty() && self.screen.first_hit(keyword).is_some() {
            return Err(DomainError::Validation(
                "search keyword contains a forbidden term".into(),
            ));
        }

        let mut sites = self.all();
        if let Some(region) = region.filter(|r| !r.is_empty() && *r != "all") {
            sites.retain(|s| s.region.contains(region) || s.address.contains(region));
        }
        if !keyword.is_empty() {
            let term = keyword.to_lowercase();
            sites.retain(|s| {
                s.name.to_lowercase().contains(&term)
                    || s.address.to_lowercase().contains(&term)
                    || s.description.to_lowercase().contains(&term)
                    || s.phone.contains(&term)
            });
        }
        Ok(sites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use configs::ModerationPolicy;

    fn directory() -> ShelterDirectory {
        ShelterDirectory::new(KeywordScreen::from_policy(&ModerationPolicy::default()))
    }

    #[test]
    fn region_filter_matches_region_and_address() {
        let sites = directory().search("", Some("新北市")).unwrap();
        assert_eq!(sites.len(), 2);
        assert!(sites.iter().all(|s| s.region == "新北市"));
    }

    #[test]
    fn keyword_search_spans_name_and_description() {
        let sites = directory().search("貓咪", None).unwrap();
        assert!(!sites.is_empty());
        assert!(sites
            .iter()
            .any(|s| s.name.contains("貓咪") || s.description.contains("貓咪")));
    }

    #[test]
    fn commerce_keywords_are_rejected() {
        let err = directory().search("出售", None).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn all_region_means_no_filter() {
        assert_eq!(
            directory().search("", Some("all")).unwrap().len(),
            directory().all().len()
        );
    }
}
