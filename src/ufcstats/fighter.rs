use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::page::{info_items, nav_rows, nav_target, row_cells, stacked_texts, title_highlight};
use super::types::{CareerStats, FightRecord, FighterFight, UfcFighter};
use crate::extract::Site;
use crate::extract::fields::{parse_count, parse_decimal, parse_percentage};
use crate::extract::table::sel;
use crate::extract::text::element_text;

static RECORD_SPAN: LazyLock<Selector> = LazyLock::new(|| sel("h2.b-content__title span.b-content__title-record"));
static NICKNAME: LazyLock<Selector> = LazyLock::new(|| sel("p.b-content__Nickname"));
static FLAG_TEXT: LazyLock<Selector> = LazyLock::new(|| sel("a.b-flag i.b-flag__text"));
static B_LINKS: LazyLock<Selector> = LazyLock::new(|| sel("a.b-link"));

static RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Record:\s*(\d+)-(\d+)-(\d+)(?:\s*\((\d+)\s*NC\))?").expect("record pattern")
});

/// Columns a history row needs before its cells are read.
const HISTORY_COLUMNS: usize = 10;

/// `None` when the page has no fighter title banner.
pub fn build_fighter(doc: &Html, fighter_url: &str) -> Option<UfcFighter> {
    let name = title_highlight(doc)?;
    let mut fighter = UfcFighter {
        id: Site::UfcStats.extract_id(fighter_url),
        url: fighter_url.to_string(),
        name: Some(name),
        record: doc.select(&RECORD_SPAN).next().and_then(|e| parse_record(&element_text(&e))),
        nickname: doc.select(&NICKNAME).next().map(|e| element_text(&e)).filter(|n| !n.is_empty()),
        ..Default::default()
    };

    for (label, value) in info_items(doc) {
        apply_info_item(&mut fighter, &label, value);
    }

    fighter.fights = nav_rows(doc).map(|tr| read_history_row(&tr, fighter_url)).collect();
    debug!(id = %fighter.id, fights = fighter.fights.len(), "ufc fighter parsed");
    Some(fighter)
}

/// `Record: 28-1-0 (1 NC)` → wins/losses/draws/no-contests.
pub fn parse_record(text: &str) -> Option<FightRecord> {
    let c = RECORD.captures(text)?;
    let n = |i: usize| c.get(i).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    Some(FightRecord { wins: n(1), losses: n(2), draws: n(3), no_contests: n(4) })
}

fn apply_info_item(f: &mut UfcFighter, label: &str, value: String) {
    let career: &mut CareerStats = &mut f.career;
    match label {
        l if l.contains("height:") => f.height = Some(value),
        l if l.contains("weight:") => f.weight = Some(value),
        l if l.contains("reach:") => f.reach = Some(value.replace('"', "").trim().to_string()),
        l if l.contains("stance:") => f.stance = Some(value),
        l if l.contains("dob:") => f.dob = Some(value),
        l if l.contains("slpm:") => career.slpm = Some(parse_decimal(&value)),
        l if l.contains("str. acc.:") => career.str_acc = Some(parse_percentage(&value)),
        l if l.contains("sapm:") => career.sapm = Some(parse_decimal(&value)),
        l if l.contains("str. def:") => career.str_def = Some(parse_percentage(&value)),
        l if l.contains("td avg.:") => career.td_avg = Some(parse_decimal(&value)),
        l if l.contains("td acc.:") => career.td_acc = Some(parse_percentage(&value)),
        l if l.contains("td def.:") => career.td_def = Some(parse_percentage(&value)),
        l if l.contains("sub. avg.:") => career.sub_avg = Some(parse_decimal(&value)),
        _ => {}
    }
}

fn read_history_row(tr: &ElementRef<'_>, fighter_url: &str) -> FighterFight {
    let mut fight = FighterFight::default();
    if let Some(url) = nav_target(tr) {
        fight.fight_id = Some(Site::UfcStats.extract_id(&url));
        fight.fight_url = Some(url);
    }

    let cols = row_cells(tr);
    if cols.len() < HISTORY_COLUMNS { return fight; }

    fight.result = cols[0].select(&FLAG_TEXT).next().map(|e| element_text(&e));

    let own = fighter_url.trim_end_matches('/');
    let opponent = cols[1]
        .select(&B_LINKS)
        .find(|a| !a.value().attr("href").unwrap_or_default().contains(own));
    if cols[1].select(&B_LINKS).count() >= 2 {
        if let Some(a) = opponent {
            fight.opponent_name = Some(element_text(&a));
            fight.opponent_id = Some(Site::UfcStats.extract_id(a.value().attr("href").unwrap_or_default()));
        }
    }

    // kd, str, td, sub: first stacked value is this fighter's.
    let own_stats: Vec<String> = cols[2..6]
        .iter()
        .filter_map(|td| {
            let texts = stacked_texts(td);
            (texts.len() >= 2).then(|| texts[0].clone())
        })
        .collect();
    if let [kd, strikes, td, sub] = own_stats.as_slice() {
        fight.kd = Some(parse_count(kd));
        fight.str = Some(parse_count(strikes));
        fight.td = Some(parse_count(td));
        fight.sub = Some(parse_count(sub));
    }

    if let Some(a) = cols[6].select(&B_LINKS).next() {
        let href = a.value().attr("href").unwrap_or_default();
        fight.event_name = Some(element_text(&a));
        fight.event_id = Some(Site::UfcStats.extract_id(href));
        fight.event_url = Some(href.to_string());
    }
    fight.date = stacked_texts(&cols[6]).get(1).cloned();

    let method = stacked_texts(&cols[7]);
    fight.method = method.first().cloned();
    fight.details = method.get(1).cloned().filter(|d| !d.is_empty());

    fight.round = Some(element_text(&cols[8]));
    fight.time = Some(element_text(&cols[9]));
    fight
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://ufcstats.com/fighter-details/07225ba28ae309b6";

    fn stacked(a: &str, b: &str) -> String {
        format!(r#"<td><p class="b-fight-details__table-text">{a}</p><p class="b-fight-details__table-text">{b}</p></td>"#)
    }

    fn page() -> String {
        format!(
            r#"<html><body>
            <h2 class="b-content__title"><span class="b-content__title-highlight"> Khabib Nurmagomedov </span>
              <span class="b-content__title-record">Record: 29-0-0</span></h2>
            <p class="b-content__Nickname">The Eagle</p>
            <ul>
              <li class="b-list__box-list-item"><i class="b-list__box-item-title">Height:</i> 5' 10"</li>
              <li class="b-list__box-list-item"><i class="b-list__box-item-title">Reach:</i> 70"</li>
              <li class="b-list__box-list-item"><i class="b-list__box-item-title">DOB:</i> Sep 20, 1988</li>
              <li class="b-list__box-list-item"><i class="b-list__box-item-title">SLpM:</i> 4.10</li>
              <li class="b-list__box-list-item"><i class="b-list__box-item-title">Str. Acc.:</i> 48%</li>
              <li class="b-list__box-list-item"><i class="b-list__box-item-title">TD Def.:</i> 84%</li>
            </ul>
            <table><tbody>
              <tr class="b-fight-details__table-row"><th>W/L</th></tr>
              <tr class="b-fight-details__table-row" onclick="doNav('http://ufcstats.com/fight-details/f00d')">
                <td><a class="b-flag"><i class="b-flag__text">win</i></a></td>
                <td><p><a class="b-link" href="{URL}">Khabib Nurmagomedov</a></p>
                    <p><a class="b-link" href="http://ufcstats.com/fighter-details/beef">Justin Gaethje</a></p></td>
                {kd}{st}{td}{sb}
                <td><p class="b-fight-details__table-text"><a class="b-link" href="http://ufcstats.com/event-details/e254">UFC 254</a></p>
                    <p class="b-fight-details__table-text">Oct. 24, 2020</p></td>
                <td><p class="b-fight-details__table-text">SUB</p><p class="b-fight-details__table-text">Triangle Choke</p></td>
                <td> 2 </td><td> 1:34 </td>
              </tr>
              <tr class="b-fight-details__table-row" onclick="doNav('http://ufcstats.com/fight-details/short')"><td>only</td></tr>
            </tbody></table>
            </body></html>"#,
            kd = stacked("0", "0"),
            st = stacked("25", "21"),
            td = stacked("0", "0"),
            sb = stacked("2", "0"),
        )
    }

    #[test]
    fn header_and_info_boxes() {
        let f = build_fighter(&Html::parse_document(&page()), URL).unwrap();
        assert_eq!(f.id, "07225ba28ae309b6");
        assert_eq!(f.name.as_deref(), Some("Khabib Nurmagomedov"));
        assert_eq!(f.record, Some(FightRecord { wins: 29, losses: 0, draws: 0, no_contests: 0 }));
        assert_eq!(f.nickname.as_deref(), Some("The Eagle"));
        assert_eq!(f.height.as_deref(), Some("5' 10\""));
        assert_eq!(f.reach.as_deref(), Some("70"));
        assert_eq!(f.dob.as_deref(), Some("Sep 20, 1988"));
        assert_eq!(f.career.slpm, Some(4.10));
        assert_eq!(f.career.str_acc, Some(48));
        assert_eq!(f.career.td_def, Some(84));
        assert_eq!(f.career.sapm, None);
    }

    #[test]
    fn history_rows() {
        let f = build_fighter(&Html::parse_document(&page()), URL).unwrap();
        assert_eq!(f.fights.len(), 2);
        let fight = &f.fights[0];
        assert_eq!(fight.fight_id.as_deref(), Some("f00d"));
        assert_eq!(fight.result.as_deref(), Some("win"));
        assert_eq!(fight.opponent_name.as_deref(), Some("Justin Gaethje"));
        assert_eq!(fight.opponent_id.as_deref(), Some("beef"));
        assert_eq!((fight.kd, fight.str, fight.td, fight.sub), (Some(0), Some(25), Some(0), Some(2)));
        assert_eq!(fight.event_id.as_deref(), Some("e254"));
        assert_eq!(fight.date.as_deref(), Some("Oct. 24, 2020"));
        assert_eq!(fight.method.as_deref(), Some("SUB"));
        assert_eq!(fight.details.as_deref(), Some("Triangle Choke"));
        assert_eq!(fight.round.as_deref(), Some("2"));
        assert_eq!(fight.time.as_deref(), Some("1:34"));

        let short = &f.fights[1];
        assert_eq!(short.fight_id.as_deref(), Some("short"));
        assert!(short.result.is_none());
    }

    #[test]
    fn record_with_no_contests() {
        assert_eq!(
            parse_record("Record: 28-1-0 (1 NC)"),
            Some(FightRecord { wins: 28, losses: 1, draws: 0, no_contests: 1 })
        );
        assert_eq!(parse_record("Record:"), None);
    }

    #[test]
    fn missing_banner_yields_none() {
        assert!(build_fighter(&Html::parse_document("<html><body><p>404</p></body></html>"), URL).is_none());
    }
}
