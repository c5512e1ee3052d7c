//! LTI 1.1 Basic Outcomes: grade passback through a signed
//! `replaceResultRequest` POX message.

use anyhow::{anyhow, bail, Context};
use url::Url;

use crate::models::lti::GradedLaunch;
use crate::utils::{html::escape, oauth1};

pub fn validate_score(score: f64) -> anyhow::Result<()> {
    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        bail!("LTI scores must be between 0.0 and 1.0, got {}", score);
    }
    Ok(())
}

pub fn replace_result_body(message_id: &str, sourcedid: &str, score: f64) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<imsx_POXEnvelopeRequest xmlns="http://www.imsglobal.org/services/ltiv1p1/xsd/imsoms_v1p0">
  <imsx_POXHeader>
    <imsx_POXRequestHeaderInfo>
      <imsx_version>V1.0</imsx_version>
      <imsx_messageIdentifier>{}</imsx_messageIdentifier>
    </imsx_POXRequestHeaderInfo>
  </imsx_POXHeader>
  <imsx_POXBody>
    <replaceResultRequest>
      <resultRecord>
        <sourcedGUID>
          <sourcedId>{}</sourcedId>
        </sourcedGUID>
        <result>
          <resultScore>
            <language>en</language>
            <textString>{}</textString>
          </resultScore>
        </result>
      </resultRecord>
    </replaceResultRequest>
  </imsx_POXBody>
</imsx_POXEnvelopeRequest>"#,
        escape(message_id),
        escape(sourcedid),
        score
    )
}

fn strip_comments(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        match rest[start..].find("-->") {
            Some(end) => rest = &rest[start + end + "-->".len()..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Text between the first `<tag>` and the following `</tag>`.
fn element<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let len = xml[start..].find(&close)?;
    Some(&xml[start..start + len])
}

/// Whether a POX response's `imsx_statusInfo` reports `imsx_codeMajor`
/// success.
pub fn is_success(response: &str) -> bool {
    let response = strip_comments(response);
    element(&response, "imsx_statusInfo")
        .and_then(|info| element(info, "imsx_codeMajor"))
        .is_some_and(|code| code.trim() == "success")
}

/// Posts `score` for the launch's result record.
pub async fn post_score(
    client: &reqwest::Client,
    launch: &GradedLaunch,
    score: f64,
) -> anyhow::Result<()> {
    validate_score(score)?;

    let url = Url::parse(&launch.lis_outcome_service_url)
        .context("Invalid lis_outcome_service_url")?;
    let message_id = uuid::Uuid::new_v4().simple().to_string();
    let body = replace_result_body(&message_id, &launch.lis_result_sourcedid, score);
    let authorization = oauth1::authorization_header(
        "POST",
        &url,
        body.as_bytes(),
        &oauth1::Credentials {
            consumer_key: &launch.consumer_key,
            consumer_secret: &launch.consumer_secret,
        },
        &oauth1::Nonce::fresh(),
    )?;

    let response = client
        .post(url)
        .header(reqwest::header::AUTHORIZATION, authorization)
        .header(reqwest::header::CONTENT_TYPE, "application/xml")
        .body(body)
        .send()
        .await
        .context("Failed to reach the LTI outcome service")?;

    let status = response.status();
    let text = response
        .text()
        .await
        .context("Failed to read the LTI outcome response")?;
    if !status.is_success() || !is_success(&text) {
        return Err(anyhow!(
            "LTI outcome service rejected the score (HTTP {})",
            status
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_outside_unit_interval_are_rejected() {
        assert!(validate_score(0.0).is_ok());
        assert!(validate_score(1.0).is_ok());
        assert!(validate_score(0.75).is_ok());
        assert!(validate_score(-0.1).is_err());
        assert!(validate_score(1.01).is_err());
        assert!(validate_score(f64::NAN).is_err());
    }

    #[test]
    fn body_escapes_sourcedid() {
        let body = replace_result_body("m1", "course:1&user<2>", 0.5);
        assert!(body.contains("<sourcedId>course:1&amp;user&lt;2&gt;</sourcedId>"));
        assert!(body.contains("<textString>0.5</textString>"));
        assert!(body.contains("<imsx_messageIdentifier>m1</imsx_messageIdentifier>"));
    }

    #[test]
    fn reads_code_major() {
        let ok = "<imsx_statusInfo><imsx_codeMajor> success </imsx_codeMajor></imsx_statusInfo>";
        let failed = "<imsx_statusInfo><imsx_codeMajor>failure</imsx_codeMajor></imsx_statusInfo>";
        assert!(is_success(ok));
        assert!(!is_success(failed));
        assert!(!is_success("<html>oops</html>"));
    }

    #[test]
    fn code_major_outside_status_info_is_ignored() {
        let commented = "<!-- <imsx_statusInfo><imsx_codeMajor>success</imsx_codeMajor></imsx_statusInfo> -->\
             <imsx_statusInfo><imsx_codeMajor>failure</imsx_codeMajor></imsx_statusInfo>";
        assert!(!is_success(commented));
        assert!(!is_success("<imsx_codeMajor>success</imsx_codeMajor>"));
    }
}
